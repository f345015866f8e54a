//! Redaction and masking policy.

use std::collections::HashSet;

/// Marker written in place of a redacted value.
pub const REDACTED: &str = "REDACTED";

/// Key used to wrap text payloads that carry no field name.
pub const PLAIN_TEXT_KEY: &str = "plain/text-type";

/// Field names redacted out of the box.
pub const DEFAULT_REDACT_KEYS: &[&str] = &["access_token", "client_secret", "Authorization", "password"];

/// Field names masked out of the box.
pub const DEFAULT_MASK_KEYS: &[&str] = &["document", "cpf", "cnpj"];

/// What the policy says about a single field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Replace the whole value with [`REDACTED`].
    Redact,
    /// Keep the edges of string leaves, hide the middle.
    Mask,
    /// Leave the value alone.
    Keep,
}

/// Case-insensitive field-name policy applied by the sanitizer.
///
/// Precedence: a name present in both key sets is redacted. When redaction is
/// bypassed (debug troubleshooting), such a name falls through to masking;
/// masking itself is never bypassed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    redact_keys: HashSet<String>,
    mask_keys: HashSet<String>,
    bypass_redaction: bool,
}

impl Policy {
    /// Build a policy from redaction and masking key lists.
    pub fn new<R, M, S, T>(redact_keys: R, mask_keys: M) -> Self
    where
        R: IntoIterator<Item = S>,
        M: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut policy = Self::default();
        policy.add_redact_keys(redact_keys);
        policy.add_mask_keys(mask_keys);
        policy
    }

    /// A policy that rewrites nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in credential and document keys.
    pub fn default_keys() -> Self {
        Self::new(DEFAULT_REDACT_KEYS, DEFAULT_MASK_KEYS)
    }

    /// Disable redaction (masking still applies).
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass_redaction = bypass;
        self
    }

    pub fn bypass_redaction(&self) -> bool {
        self.bypass_redaction
    }

    pub fn add_redact_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.redact_keys
            .extend(keys.into_iter().map(|k| k.as_ref().to_lowercase()));
    }

    pub fn add_mask_keys<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mask_keys
            .extend(keys.into_iter().map(|k| k.as_ref().to_lowercase()));
    }

    /// Resolve the rule for a field name.
    pub fn rule_for(&self, field: &str) -> FieldRule {
        if self.redact_keys.is_empty() && self.mask_keys.is_empty() {
            return FieldRule::Keep;
        }

        let field = field.to_lowercase();
        if !self.bypass_redaction && self.redact_keys.contains(&field) {
            FieldRule::Redact
        } else if self.mask_keys.contains(&field) {
            FieldRule::Mask
        } else {
            FieldRule::Keep
        }
    }

    /// Names listed under both redaction and masking, sorted.
    pub fn overlapping_keys(&self) -> Vec<&str> {
        let mut overlap: Vec<&str> = self
            .redact_keys
            .intersection(&self.mask_keys)
            .map(String::as_str)
            .collect();
        overlap.sort_unstable();
        overlap
    }

    pub fn is_empty(&self) -> bool {
        self.redact_keys.is_empty() && self.mask_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_is_case_insensitive() {
        let policy = Policy::new(["Authorization"], ["CPF"]);
        assert_eq!(policy.rule_for("authorization"), FieldRule::Redact);
        assert_eq!(policy.rule_for("AUTHORIZATION"), FieldRule::Redact);
        assert_eq!(policy.rule_for("cpf"), FieldRule::Mask);
        assert_eq!(policy.rule_for("name"), FieldRule::Keep);
    }

    #[test]
    fn test_redaction_wins_over_masking() {
        let policy = Policy::new(["token"], ["token"]);
        assert_eq!(policy.rule_for("token"), FieldRule::Redact);
        assert_eq!(policy.overlapping_keys(), vec!["token"]);
    }

    #[test]
    fn test_bypass_disables_redaction_only() {
        let policy = Policy::new(["password", "token"], ["token", "cpf"]).with_bypass(true);
        assert_eq!(policy.rule_for("password"), FieldRule::Keep);
        assert_eq!(policy.rule_for("token"), FieldRule::Mask);
        assert_eq!(policy.rule_for("cpf"), FieldRule::Mask);
    }

    #[test]
    fn test_default_keys() {
        let policy = Policy::default_keys();
        assert_eq!(policy.rule_for("access_token"), FieldRule::Redact);
        assert_eq!(policy.rule_for("authorization"), FieldRule::Redact);
        assert_eq!(policy.rule_for("document"), FieldRule::Mask);
        assert!(policy.overlapping_keys().is_empty());
    }

    #[test]
    fn test_add_keys_extends_policy() {
        let mut policy = Policy::empty();
        assert!(policy.is_empty());

        policy.add_redact_keys(["secret"]);
        policy.add_mask_keys(vec!["phone".to_string()]);
        assert_eq!(policy.rule_for("Secret"), FieldRule::Redact);
        assert_eq!(policy.rule_for("phone"), FieldRule::Mask);
    }
}
