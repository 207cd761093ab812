//! Static category → HR role routing policy.
//!
//! The table is built once and never mutated. Lookups are pure; a category
//! missing from the table is a hard [`DeskError::UnknownCategory`], never a
//! silent fallback to a generic role.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::DeskError;
use crate::model::actor::Role;
use crate::model::category::Category;

/// Routing policy for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Never empty.
    pub roles: BTreeSet<Role>,
    pub confidential: bool,
}

/// Immutable category → eligible-roles mapping.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    entries: BTreeMap<Category, RoutingEntry>,
}

impl RoutingTable {
    /// The built-in policy covering the full category catalog.
    #[must_use]
    pub fn standard() -> Self {
        use Category as C;
        use Role as R;

        let rows: [(Category, &[Role]); 29] = [
            (C::LeaveIssue, &[R::HrExecutive]),
            (C::AttendanceIssue, &[R::HrExecutive, R::HrOperations]),
            (C::PayrollSalary, &[R::HrManager]),
            (C::TaxDeduction, &[R::HrManager]),
            (C::Reimbursement, &[R::HrManager, R::HrOperations]),
            (C::BenefitsInsurance, &[R::HrBusinessPartner, R::HrExecutive]),
            (C::ProvidentFund, &[R::HrManager]),
            (C::HarassmentGrievance, &[R::HrManager]),
            (C::PolicyClarification, &[R::HrExecutive, R::HrBusinessPartner]),
            (C::Onboarding, &[R::HrOperations, R::TalentAcquisition]),
            (C::ExitOffboarding, &[R::HrOperations, R::HrExecutive]),
            (C::DocumentRequest, &[R::HrExecutive]),
            (C::ProfileUpdate, &[R::HrOperations]),
            (C::PerformanceReview, &[R::HrBusinessPartner, R::HrManager]),
            (C::PromotionTransfer, &[R::HrBusinessPartner, R::HrManager]),
            (C::TrainingLearning, &[R::HrBusinessPartner]),
            (C::Recruitment, &[R::TalentAcquisition]),
            (C::InterviewScheduling, &[R::TalentAcquisition]),
            (C::ShiftRoster, &[R::HrOperations]),
            (C::WorkFromHome, &[R::HrExecutive]),
            (C::AssetRequest, &[R::HrOperations]),
            (C::AccessCard, &[R::HrOperations]),
            (C::TravelRequest, &[R::HrOperations]),
            (C::ComplianceEthics, &[R::HrManager]),
            (C::HealthSafety, &[R::HrManager, R::HrOperations]),
            (C::EmployeeRelations, &[R::HrBusinessPartner]),
            (C::CompensationReview, &[R::HrManager]),
            (C::HrSystemAccess, &[R::HrOperations]),
            (C::GeneralInquiry, &[R::HrExecutive]),
        ];

        Self::from_rows(
            rows.into_iter()
                .map(|(category, roles)| (category, roles.iter().copied().collect())),
        )
    }

    /// Build a table from explicit rows. Rows with an empty role set are
    /// dropped, so such categories fail lookup instead of routing nowhere.
    pub fn from_rows(rows: impl IntoIterator<Item = (Category, BTreeSet<Role>)>) -> Self {
        let entries = rows
            .into_iter()
            .filter(|(_, roles)| !roles.is_empty())
            .map(|(category, roles)| {
                let entry = RoutingEntry {
                    roles,
                    confidential: category == Category::HarassmentGrievance,
                };
                (category, entry)
            })
            .collect();
        Self { entries }
    }

    /// Eligible roles and confidentiality for `category`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::UnknownCategory`] if the table has no row for it.
    pub fn roles_for(&self, category: Category) -> Result<&RoutingEntry, DeskError> {
        self.entries
            .get(&category)
            .ok_or_else(|| DeskError::UnknownCategory(category.label().to_string()))
    }

    /// Every role that is eligible for at least one category.
    #[must_use]
    pub fn routable_roles(&self) -> BTreeSet<Role> {
        self.entries
            .values()
            .flat_map(|entry| entry.roles.iter().copied())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &RoutingEntry)> {
        self.entries.iter().map(|(category, entry)| (*category, entry))
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::standard()
    }
}
