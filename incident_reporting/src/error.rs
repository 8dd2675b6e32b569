use cosmwasm_std::StdError;
use thiserror::Error;

use crate::state::ReportStatus;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not authorized ranger")]
    NotAuthorizedRanger,

    #[error("Report {id} not found")]
    NotFound { id: u64 },

    #[error("Report already exists")]
    DuplicateReport,

    #[error("Invalid coordinates")]
    InvalidCoordinates,

    #[error("Ranger already voted on this report")]
    AlreadyVoted,

    #[error("Invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition { from: ReportStatus, to: ReportStatus },

    #[error("Report not verified")]
    ReportNotVerified,

    #[error("Reward already claimed")]
    AlreadyClaimed,

    #[error("Not report owner")]
    NotReportOwner,

    #[error("Insufficient reward pool")]
    InsufficientRewardPool,

    #[error("No pending owner")]
    NoPendingOwner,

    #[error("Bad request: {msg}")]
    BadRequest { msg: String },
}
