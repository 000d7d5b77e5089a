//! Data-described mutually-exclusive flag groups.
//!
//! Commands declare which [`FlagGroup`]s apply to them and report which
//! flags the caller actually supplied. [`validate`] checks the groups in
//! order and returns the first violation. It performs no I/O, so it runs
//! before any signing or network work.

use std::collections::BTreeSet;

use crate::error::{FlagViolation, ViolationKind};

/// A set of flags of which at most one may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagGroup {
	pub name: &'static str,
	pub flags: &'static [&'static str],
	pub required: bool,
}

impl FlagGroup {
	pub const fn optional(name: &'static str, flags: &'static [&'static str]) -> Self {
		Self { name, flags, required: false }
	}

	pub const fn required(name: &'static str, flags: &'static [&'static str]) -> Self {
		Self { name, flags, required: true }
	}

	fn check(&self, supplied: &SuppliedFlags) -> Result<(), FlagViolation> {
		let present: Vec<String> = self
			.flags
			.iter()
			.filter(|flag| supplied.contains(flag))
			.map(|flag| (*flag).to_owned())
			.collect();

		match present.len() {
			0 if self.required => Err(self.too_few()),
			0 | 1 => Ok(()),
			_ => Err(FlagViolation {
				group: self.name.to_owned(),
				kind: ViolationKind::TooMany,
				flags: present,
			}),
		}
	}

	/// At least one flag of the group must be present; several are fine.
	pub fn require_any(&self, supplied: &SuppliedFlags) -> Result<(), FlagViolation> {
		if self.flags.iter().any(|flag| supplied.contains(flag)) {
			Ok(())
		} else {
			Err(self.too_few())
		}
	}

	fn too_few(&self) -> FlagViolation {
		FlagViolation {
			group: self.name.to_owned(),
			kind: ViolationKind::TooFew,
			flags: self.flags.iter().map(|f| (*f).to_owned()).collect(),
		}
	}
}

/// Raw key or encrypted keystore. Absence is reported by the signing
/// resolver, not here.
pub const CREDENTIAL: FlagGroup = FlagGroup::optional("credential", &["private-key", "keyfile"]);

/// Inline keystore password or password file.
pub const PASSWORD_SOURCE: FlagGroup =
	FlagGroup::optional("password", &["keyfile-password", "keyfile-password-file"]);

/// `tx create` must say whether it signs.
pub const SIGNING_MODE: FlagGroup = FlagGroup::required("signing mode", &["signed", "unsigned"]);

/// Something to read the nonce for when building online without signing.
/// Checked with [`FlagGroup::require_any`]: a key may come with `--from`.
pub const SENDER: FlagGroup = FlagGroup::required("sender", &["from", "private-key", "keyfile"]);

/// Names of the flags a caller explicitly supplied.
///
/// A flag counts as supplied when it appeared on the command line or in
/// its environment variable, even if its value is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppliedFlags(BTreeSet<String>);

impl SuppliedFlags {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mark(&mut self, flag: &str) {
		self.0.insert(flag.to_owned());
	}

	/// Mark `flag` when `present` is true; returns `self` for chaining.
	pub fn mark_if(&mut self, flag: &str, present: bool) -> &mut Self {
		if present {
			self.mark(flag);
		}
		self
	}

	pub fn contains(&self, flag: &str) -> bool {
		self.0.contains(flag)
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl<'a> FromIterator<&'a str> for SuppliedFlags {
	fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
		Self(iter.into_iter().map(str::to_owned).collect())
	}
}

/// Check every group against the supplied flags.
pub fn validate(groups: &[FlagGroup], supplied: &SuppliedFlags) -> Result<(), FlagViolation> {
	for group in groups {
		group.check(supplied)?;
	}
	Ok(())
}
