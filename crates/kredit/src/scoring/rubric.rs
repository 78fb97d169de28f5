//! The Rubric Store: the immutable scoring hierarchy of categories,
//! criteria, and selectable score options.
//!
//! The hierarchy is validated once at construction and read-only
//! afterwards; rubric authoring is not part of this service.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! rubric_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Serialize,
            Deserialize,
        )]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

rubric_id!(CategoryId);
rubric_id!(CriteriaId);
rubric_id!(ScoreOptionId);

/// Top level of the rubric. `weight` is a percentage applied to the
/// category's summed weighted scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub weight: f64,
    pub order: u32,
}

/// A scored question belonging to exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: CriteriaId,
    pub category_id: CategoryId,
    pub name: String,
    pub weight: f64,
    pub order: u32,
}

/// One selectable answer with its raw point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOption {
    pub id: ScoreOptionId,
    pub criteria_id: CriteriaId,
    pub description: String,
    pub score: i32,
    pub order: u32,
}

/// Configuration failures detected when loading a rubric.
#[derive(Debug, thiserror::Error)]
pub enum RubricError {
    #[error("rubric must contain at least one category and one criterion")]
    Empty,
    #[error("duplicate category id {0}")]
    DuplicateCategory(CategoryId),
    #[error("duplicate criterion id {0}")]
    DuplicateCriterion(CriteriaId),
    #[error("duplicate score option id {0}")]
    DuplicateOption(ScoreOptionId),
    #[error("criterion {criterion} references unknown category {category}")]
    UnknownCategory {
        criterion: CriteriaId,
        category: CategoryId,
    },
    #[error("score option {option} references unknown criterion {criterion}")]
    UnknownCriterion {
        option: ScoreOptionId,
        criterion: CriteriaId,
    },
    #[error("weight {weight} for '{name}' is outside 0-100")]
    WeightOutOfRange { name: String, weight: f64 },
    #[error("category weights sum to {total}, expected 100")]
    CategoryWeightSum { total: f64 },
    #[error("draft span must cover at least one and fewer than all categories (got {span} of {categories})")]
    InvalidDraftSpan { span: usize, categories: usize },
}

/// The loaded, validated hierarchy. Lookups are by id; iteration follows
/// the seeded `order` fields.
#[derive(Debug)]
pub struct Rubric {
    categories: Vec<Category>,
    criteria: BTreeMap<CriteriaId, Criterion>,
    options: BTreeMap<ScoreOptionId, ScoreOption>,
    draft_category_span: usize,
}

impl Rubric {
    /// Validate and index a rubric. `draft_category_span` is how many of
    /// the leading categories (by `order`) form the applicant-facing
    /// early stage; the complement is reserved for officer assessment.
    pub fn new(
        mut categories: Vec<Category>,
        criteria: Vec<Criterion>,
        options: Vec<ScoreOption>,
        draft_category_span: usize,
    ) -> Result<Self, RubricError> {
        if categories.is_empty() || criteria.is_empty() {
            return Err(RubricError::Empty);
        }
        if draft_category_span == 0 || draft_category_span >= categories.len() {
            return Err(RubricError::InvalidDraftSpan {
                span: draft_category_span,
                categories: categories.len(),
            });
        }

        categories.sort_by_key(|category| category.order);

        let mut category_ids = BTreeSet::new();
        let mut weight_total = 0.0;
        for category in &categories {
            if !category_ids.insert(category.id) {
                return Err(RubricError::DuplicateCategory(category.id));
            }
            check_weight(&category.name, category.weight)?;
            weight_total += category.weight;
        }
        if (weight_total - 100.0).abs() > 1e-6 {
            return Err(RubricError::CategoryWeightSum {
                total: weight_total,
            });
        }

        let mut indexed_criteria = BTreeMap::new();
        for criterion in criteria {
            if !category_ids.contains(&criterion.category_id) {
                return Err(RubricError::UnknownCategory {
                    criterion: criterion.id,
                    category: criterion.category_id,
                });
            }
            check_weight(&criterion.name, criterion.weight)?;
            let id = criterion.id;
            if indexed_criteria.insert(id, criterion).is_some() {
                return Err(RubricError::DuplicateCriterion(id));
            }
        }

        let mut indexed_options = BTreeMap::new();
        for option in options {
            if !indexed_criteria.contains_key(&option.criteria_id) {
                return Err(RubricError::UnknownCriterion {
                    option: option.id,
                    criterion: option.criteria_id,
                });
            }
            let id = option.id;
            if indexed_options.insert(id, option).is_some() {
                return Err(RubricError::DuplicateOption(id));
            }
        }

        Ok(Self {
            categories,
            criteria: indexed_criteria,
            options: indexed_options,
            draft_category_span,
        })
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn criterion(&self, id: CriteriaId) -> Option<&Criterion> {
        self.criteria.get(&id)
    }

    pub fn score_option(&self, id: ScoreOptionId) -> Option<&ScoreOption> {
        self.options.get(&id)
    }

    pub fn criteria_count(&self) -> usize {
        self.criteria.len()
    }

    /// Criteria an applicant may answer when opening a draft: those of
    /// the first `draft_category_span` categories.
    pub fn early_criteria(&self) -> BTreeSet<CriteriaId> {
        self.stage_criteria(&self.categories[..self.draft_category_span])
    }

    /// The complement of [`Rubric::early_criteria`], reserved for the
    /// officer's completing assessment.
    pub fn later_criteria(&self) -> BTreeSet<CriteriaId> {
        self.stage_criteria(&self.categories[self.draft_category_span..])
    }

    fn stage_criteria(&self, categories: &[Category]) -> BTreeSet<CriteriaId> {
        let ids: BTreeSet<CategoryId> = categories.iter().map(|category| category.id).collect();
        self.criteria
            .values()
            .filter(|criterion| ids.contains(&criterion.category_id))
            .map(|criterion| criterion.id)
            .collect()
    }

    /// The full hierarchy, categories by `order`, nested criteria and
    /// options by `order`.
    pub fn full(&self) -> Vec<CategoryView> {
        self.categories
            .iter()
            .map(|category| {
                let mut criteria: Vec<&Criterion> = self
                    .criteria
                    .values()
                    .filter(|criterion| criterion.category_id == category.id)
                    .collect();
                criteria.sort_by_key(|criterion| criterion.order);

                CategoryView {
                    id: category.id,
                    name: category.name.clone(),
                    weight: category.weight,
                    order: category.order,
                    criteria: criteria
                        .into_iter()
                        .map(|criterion| {
                            let mut options: Vec<&ScoreOption> = self
                                .options
                                .values()
                                .filter(|option| option.criteria_id == criterion.id)
                                .collect();
                            options.sort_by_key(|option| option.order);

                            CriterionView {
                                id: criterion.id,
                                name: criterion.name.clone(),
                                weight: criterion.weight,
                                order: criterion.order,
                                options: options
                                    .into_iter()
                                    .map(|option| ScoreOptionView {
                                        id: option.id,
                                        description: option.description.clone(),
                                        score: option.score,
                                        order: option.order,
                                    })
                                    .collect(),
                            }
                        })
                        .collect(),
                }
            })
            .collect()
    }

    /// The production hierarchy: six categories, twenty-two criteria,
    /// three options each. The first three categories form the
    /// applicant-facing draft stage.
    pub fn standard() -> Result<Self, RubricError> {
        standard_rubric()
    }
}

fn check_weight(name: &str, weight: f64) -> Result<(), RubricError> {
    if !(0.0..=100.0).contains(&weight) || !weight.is_finite() {
        return Err(RubricError::WeightOutOfRange {
            name: name.to_string(),
            weight,
        });
    }
    Ok(())
}

/// Serializable nested view of the hierarchy for the structure endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub weight: f64,
    pub order: u32,
    pub criteria: Vec<CriterionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionView {
    pub id: CriteriaId,
    pub name: String,
    pub weight: f64,
    pub order: u32,
    pub options: Vec<ScoreOptionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOptionView {
    pub id: ScoreOptionId,
    pub description: String,
    pub score: i32,
    pub order: u32,
}

fn standard_rubric() -> Result<Rubric, RubricError> {
    let categories = vec![
        seed_category(1, "Applicant Profile", 20.0),
        seed_category(2, "Employment", 15.0),
        seed_category(3, "Residence", 15.0),
        seed_category(4, "Financial Capacity", 20.0),
        seed_category(5, "Credit History", 15.0),
        seed_category(6, "Collateral & Guarantees", 15.0),
    ];

    // (category, criterion name, criterion weight, three option tiers)
    let seed: &[(u32, &str, f64, [(&str, i32); 3])] = &[
        (1, "Age bracket", 25.0, [
            ("25-45 years", 100),
            ("21-24 or 46-55 years", 60),
            ("Under 21 or over 55 years", 20),
        ]),
        (1, "Marital status", 20.0, [
            ("Married", 100),
            ("Single", 60),
            ("Divorced or widowed", 40),
        ]),
        (1, "Number of dependents", 25.0, [
            ("No dependents", 100),
            ("One or two dependents", 60),
            ("Three or more dependents", 30),
        ]),
        (1, "Education level", 30.0, [
            ("University degree", 100),
            ("Secondary education", 60),
            ("Primary education or below", 30),
        ]),
        (2, "Employment type", 30.0, [
            ("Permanent employee or civil servant", 100),
            ("Contract employee or self-employed", 60),
            ("Informal or seasonal work", 20),
        ]),
        (2, "Years with current employer", 30.0, [
            ("More than 5 years", 100),
            ("2-5 years", 60),
            ("Less than 2 years", 30),
        ]),
        (2, "Industry outlook", 20.0, [
            ("Growing industry", 100),
            ("Stable industry", 60),
            ("Declining industry", 20),
        ]),
        (2, "Position level", 20.0, [
            ("Managerial", 100),
            ("Supervisory or senior staff", 60),
            ("Entry level", 40),
        ]),
        (3, "Home ownership", 40.0, [
            ("Owned outright", 100),
            ("Mortgaged or family-owned", 60),
            ("Rented", 30),
        ]),
        (3, "Years at current address", 30.0, [
            ("More than 5 years", 100),
            ("2-5 years", 60),
            ("Less than 2 years", 30),
        ]),
        (3, "Residence type", 30.0, [
            ("Permanent structure", 100),
            ("Semi-permanent structure", 60),
            ("Temporary structure", 20),
        ]),
        (4, "Monthly net income", 30.0, [
            ("More than 3x the installment", 100),
            ("2-3x the installment", 60),
            ("Less than 2x the installment", 20),
        ]),
        (4, "Debt-to-income ratio", 30.0, [
            ("Below 30 percent", 100),
            ("30-50 percent", 60),
            ("Above 50 percent", 20),
        ]),
        (4, "Savings balance", 20.0, [
            ("More than 6 months of installments", 100),
            ("3-6 months of installments", 60),
            ("Less than 3 months of installments", 30),
        ]),
        (4, "Active loan count", 20.0, [
            ("No other active loans", 100),
            ("One other active loan", 60),
            ("Two or more active loans", 20),
        ]),
        (5, "Payment delinquencies", 40.0, [
            ("No delinquencies on record", 100),
            ("Delinquencies cured within 30 days", 50),
            ("Delinquencies beyond 90 days", 10),
        ]),
        (5, "Credit utilization", 30.0, [
            ("Below 30 percent of limits", 100),
            ("30-70 percent of limits", 60),
            ("Above 70 percent of limits", 20),
        ]),
        (5, "Prior loan performance", 30.0, [
            ("Previous loans repaid on schedule", 100),
            ("No borrowing history", 60),
            ("Previous loans restructured", 20),
        ]),
        (6, "Collateral type", 30.0, [
            ("Land or building certificate", 100),
            ("Vehicle title", 60),
            ("No collateral", 10),
        ]),
        (6, "Collateral coverage ratio", 30.0, [
            ("Above 150 percent of principal", 100),
            ("100-150 percent of principal", 60),
            ("Below 100 percent of principal", 20),
        ]),
        (6, "Guarantor availability", 20.0, [
            ("Guarantor with verified income", 100),
            ("Guarantor without verified income", 60),
            ("No guarantor", 20),
        ]),
        (6, "Credit insurance", 20.0, [
            ("Fully insured", 100),
            ("Partially insured", 60),
            ("Uninsured", 20),
        ]),
    ];

    let mut criteria = Vec::new();
    let mut options = Vec::new();
    let mut per_category_order: BTreeMap<u32, u32> = BTreeMap::new();
    for (index, (category, name, weight, tiers)) in seed.iter().enumerate() {
        let criteria_id = CriteriaId(index as u32 + 1);
        let order = per_category_order.entry(*category).or_insert(0);
        *order += 1;
        criteria.push(Criterion {
            id: criteria_id,
            category_id: CategoryId(*category),
            name: (*name).to_string(),
            weight: *weight,
            order: *order,
        });
        for (tier, (description, score)) in tiers.iter().enumerate() {
            options.push(ScoreOption {
                id: ScoreOptionId((index * 3 + tier) as u32 + 1),
                criteria_id,
                description: (*description).to_string(),
                score: *score,
                order: tier as u32 + 1,
            });
        }
    }

    Rubric::new(categories, criteria, options, 3)
}

fn seed_category(id: u32, name: &str, weight: f64) -> Category {
    Category {
        id: CategoryId(id),
        name: name.to_string(),
        weight,
        order: id,
    }
}
