//! Process exit codes.
//!
//! A mined-but-failed transaction and one that was never mined are
//! reported with different codes so scripts can tell them apart.

use crate::error::{ConfirmationError, Error};

/// Successful operation.
pub const EXIT_SUCCESS: u8 = 0;

/// Any fatal error: flags, config, signing, network, encoding.
pub const EXIT_ERROR: u8 = 1;

/// The transaction was mined with a failure status.
pub const EXIT_REVERTED: u8 = 2;

/// No receipt was observed before the deadline.
pub const EXIT_TIMEOUT: u8 = 3;

/// Pick the exit code for an error returned by a command.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
	let confirmation = err
		.downcast_ref::<ConfirmationError>()
		.or_else(|| match err.downcast_ref::<Error>() {
			Some(Error::Confirmation(e)) => Some(e),
			_ => None,
		});
	match confirmation {
		Some(ConfirmationError::Reverted { .. }) => EXIT_REVERTED,
		Some(ConfirmationError::Timeout { .. }) => EXIT_TIMEOUT,
		None => EXIT_ERROR,
	}
}
