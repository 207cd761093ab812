use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::normalize;
use crate::error::DeskError;

/// The fixed ticket category catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LeaveIssue,
    AttendanceIssue,
    PayrollSalary,
    TaxDeduction,
    Reimbursement,
    BenefitsInsurance,
    ProvidentFund,
    HarassmentGrievance,
    PolicyClarification,
    Onboarding,
    ExitOffboarding,
    DocumentRequest,
    ProfileUpdate,
    PerformanceReview,
    PromotionTransfer,
    TrainingLearning,
    Recruitment,
    InterviewScheduling,
    ShiftRoster,
    WorkFromHome,
    AssetRequest,
    AccessCard,
    TravelRequest,
    ComplianceEthics,
    HealthSafety,
    EmployeeRelations,
    CompensationReview,
    HrSystemAccess,
    GeneralInquiry,
}

impl Category {
    pub const ALL: [Self; 29] = [
        Self::LeaveIssue,
        Self::AttendanceIssue,
        Self::PayrollSalary,
        Self::TaxDeduction,
        Self::Reimbursement,
        Self::BenefitsInsurance,
        Self::ProvidentFund,
        Self::HarassmentGrievance,
        Self::PolicyClarification,
        Self::Onboarding,
        Self::ExitOffboarding,
        Self::DocumentRequest,
        Self::ProfileUpdate,
        Self::PerformanceReview,
        Self::PromotionTransfer,
        Self::TrainingLearning,
        Self::Recruitment,
        Self::InterviewScheduling,
        Self::ShiftRoster,
        Self::WorkFromHome,
        Self::AssetRequest,
        Self::AccessCard,
        Self::TravelRequest,
        Self::ComplianceEthics,
        Self::HealthSafety,
        Self::EmployeeRelations,
        Self::CompensationReview,
        Self::HrSystemAccess,
        Self::GeneralInquiry,
    ];

    /// Human label as shown on the ticket form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LeaveIssue => "Leave Issue",
            Self::AttendanceIssue => "Attendance / Timesheet Issue",
            Self::PayrollSalary => "Payroll / Salary Issue",
            Self::TaxDeduction => "Tax / TDS Deduction",
            Self::Reimbursement => "Reimbursement / Expense Claim",
            Self::BenefitsInsurance => "Benefits / Insurance",
            Self::ProvidentFund => "Provident Fund / Pension",
            Self::HarassmentGrievance => "Harassment / Grievance",
            Self::PolicyClarification => "Policy Clarification",
            Self::Onboarding => "Onboarding Issue",
            Self::ExitOffboarding => "Exit / Offboarding",
            Self::DocumentRequest => "Document Request",
            Self::ProfileUpdate => "Profile / Personal Data Update",
            Self::PerformanceReview => "Performance Review / Appraisal",
            Self::PromotionTransfer => "Promotion / Transfer",
            Self::TrainingLearning => "Training & Learning",
            Self::Recruitment => "Recruitment / Referral",
            Self::InterviewScheduling => "Interview Scheduling",
            Self::ShiftRoster => "Shift / Roster Change",
            Self::WorkFromHome => "Work From Home Request",
            Self::AssetRequest => "Asset / Equipment Request",
            Self::AccessCard => "Access Card / ID Card",
            Self::TravelRequest => "Travel Request",
            Self::ComplianceEthics => "Compliance / Ethics Concern",
            Self::HealthSafety => "Health & Safety",
            Self::EmployeeRelations => "Employee Relations",
            Self::CompensationReview => "Compensation Review",
            Self::HrSystemAccess => "HR Portal / System Access",
            Self::GeneralInquiry => "General Inquiry",
        }
    }

    /// Stable storage key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::LeaveIssue => "leave_issue",
            Self::AttendanceIssue => "attendance_issue",
            Self::PayrollSalary => "payroll_salary",
            Self::TaxDeduction => "tax_deduction",
            Self::Reimbursement => "reimbursement",
            Self::BenefitsInsurance => "benefits_insurance",
            Self::ProvidentFund => "provident_fund",
            Self::HarassmentGrievance => "harassment_grievance",
            Self::PolicyClarification => "policy_clarification",
            Self::Onboarding => "onboarding",
            Self::ExitOffboarding => "exit_offboarding",
            Self::DocumentRequest => "document_request",
            Self::ProfileUpdate => "profile_update",
            Self::PerformanceReview => "performance_review",
            Self::PromotionTransfer => "promotion_transfer",
            Self::TrainingLearning => "training_learning",
            Self::Recruitment => "recruitment",
            Self::InterviewScheduling => "interview_scheduling",
            Self::ShiftRoster => "shift_roster",
            Self::WorkFromHome => "work_from_home",
            Self::AssetRequest => "asset_request",
            Self::AccessCard => "access_card",
            Self::TravelRequest => "travel_request",
            Self::ComplianceEthics => "compliance_ethics",
            Self::HealthSafety => "health_safety",
            Self::EmployeeRelations => "employee_relations",
            Self::CompensationReview => "compensation_review",
            Self::HrSystemAccess => "hr_system_access",
            Self::GeneralInquiry => "general_inquiry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the storage key (`payroll_salary`, `payroll-salary`) or the
/// form label (`Payroll / Salary Issue`, case-insensitive).
impl FromStr for Category {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        let label = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.key() == key || c.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| DeskError::UnknownCategory(s.to_string()))
    }
}
