use crate::infra::InMemoryAssessmentRepository;
use clap::Args;
use std::sync::Arc;

use kredit::error::AppError;
use kredit::scoring::{
    Actor, AssessmentService, CriteriaId, Role, Rubric, ScoreOptionId, Selection, UserId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Option tier to select for every criterion (1 = best, 3 = worst)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=3))]
    pub(crate) tier: u32,
    /// Subject id to attribute the applicant stage to
    #[arg(long, default_value = "demo-user")]
    pub(crate) subject: String,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let rubric = Arc::new(Rubric::standard()?);
    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let service = AssessmentService::new(repository, rubric.clone());

    let applicant = Actor {
        subject: UserId(args.subject.clone()),
        role: Role::User,
    };
    let officer = Actor {
        subject: UserId("demo-officer".to_string()),
        role: Role::Officer,
    };

    println!("Credit scoring demo (tier {} answers)", args.tier);
    println!(
        "Rubric: {} categories, {} criteria",
        rubric.full().len(),
        rubric.criteria_count()
    );

    let draft_batch = tier_selections(&rubric, rubric.early_criteria(), args.tier);
    let draft = match service.submit_early_draft(&applicant, &draft_batch) {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Draft rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- Applicant draft {} accepted ({} criteria answered)",
        draft.application_number,
        draft_batch.len()
    );

    let officer_batch = tier_selections(&rubric, rubric.later_criteria(), args.tier);
    let assessed = match service.complete_assessment(&officer, &draft.application_id, &officer_batch)
    {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Assessment failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- Officer completed the assessment: status {} | total score {:.2}",
        assessed.status, assessed.total_score
    );

    let report = match service.report(&officer, &draft.application_id) {
        Ok(report) => report,
        Err(err) => {
            println!("  Report unavailable: {err}");
            return Ok(());
        }
    };
    if let Some(risk) = report.risk_category {
        println!("- Risk classification: {}", risk.label());
    }
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("  Assessment report payload:\n{json}"),
        Err(err) => println!("  Assessment report payload unavailable: {err}"),
    }

    Ok(())
}

/// Options are seeded three per criterion, best tier first, so tier `t`
/// of criterion `c` carries id `(c - 1) * 3 + t`.
fn tier_selections(
    rubric: &Rubric,
    criteria: std::collections::BTreeSet<CriteriaId>,
    tier: u32,
) -> Vec<Selection> {
    criteria
        .into_iter()
        .filter_map(|criteria_id| {
            let candidate = ScoreOptionId((criteria_id.0 - 1) * 3 + tier);
            rubric.score_option(candidate).map(|option| Selection {
                criteria_id,
                score_option_id: option.id,
            })
        })
        .collect()
}
