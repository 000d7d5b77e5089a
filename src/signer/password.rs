//! Keystore password acquisition.
//!
//! Sources are tried in order and the first one that has a password wins:
//! inline flag, then password file, then an interactive masked prompt.
//! Nothing is tried after the prompt.

use std::path::Path;

use zeroize::Zeroizing;

use crate::error::SigningError;

/// One place a keystore password may come from.
pub trait PasswordSource {
	fn name(&self) -> &'static str;

	/// `Ok(None)` when this source has nothing to offer.
	fn fetch(&self) -> Result<Option<Zeroizing<String>>, SigningError>;
}

/// `--keyfile-password`. An empty value still counts as supplied.
pub struct InlinePassword<'a>(pub Option<&'a str>);

impl PasswordSource for InlinePassword<'_> {
	fn name(&self) -> &'static str {
		"inline"
	}

	fn fetch(&self) -> Result<Option<Zeroizing<String>>, SigningError> {
		Ok(self.0.map(|p| Zeroizing::new(p.to_owned())))
	}
}

/// `--keyfile-password-file`; a single trailing newline is stripped.
pub struct FilePassword<'a>(pub Option<&'a Path>);

impl PasswordSource for FilePassword<'_> {
	fn name(&self) -> &'static str {
		"file"
	}

	fn fetch(&self) -> Result<Option<Zeroizing<String>>, SigningError> {
		let Some(path) = self.0 else {
			return Ok(None);
		};
		let content = Zeroizing::new(std::fs::read_to_string(path).map_err(|source| {
			SigningError::PasswordFile {
				path: path.to_owned(),
				source,
			}
		})?);
		let line = content
			.strip_suffix("\r\n")
			.or_else(|| content.strip_suffix('\n'))
			.unwrap_or(content.as_str());
		Ok(Some(Zeroizing::new(line.to_owned())))
	}
}

/// Interactive prompt on the controlling terminal with echo disabled.
pub struct PromptPassword {
	prompt: String,
}

impl PromptPassword {
	pub fn new(prompt: impl Into<String>) -> Self {
		Self { prompt: prompt.into() }
	}
}

impl Default for PromptPassword {
	fn default() -> Self {
		Self::new("Enter keystore password: ")
	}
}

impl PasswordSource for PromptPassword {
	fn name(&self) -> &'static str {
		"prompt"
	}

	fn fetch(&self) -> Result<Option<Zeroizing<String>>, SigningError> {
		let password = rpassword::prompt_password(&self.prompt).map_err(SigningError::PasswordPrompt)?;
		Ok(Some(Zeroizing::new(password)))
	}
}

/// Return the password from the first source that has one.
pub fn acquire(sources: &[&dyn PasswordSource]) -> Result<Zeroizing<String>, SigningError> {
	for source in sources {
		if let Some(password) = source.fetch()? {
			tracing::debug!(source = source.name(), "keystore password acquired");
			return Ok(password);
		}
	}
	Err(SigningError::NoPassword)
}
