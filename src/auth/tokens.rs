use rand::Rng;
use std::collections::HashMap;

use super::Actor;

/// Bearer tokens known to the service, each mapped to the actor it identifies.
#[derive(Debug, Clone, Default)]
pub struct ActorDirectory {
    tokens: HashMap<String, Actor>,
}

impl ActorDirectory {
    /// Parse `token=name:role` entries separated by commas.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let mut tokens = HashMap::new();
        for entry in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (token, who) = entry
                .split_once('=')
                .ok_or_else(|| format!("Actor entry '{entry}' is missing '='"))?;
            let (name, role) = who
                .split_once(':')
                .ok_or_else(|| format!("Actor entry for '{}' is missing ':role'", who.trim()))?;
            let (token, name, role) = (token.trim(), name.trim(), role.trim());
            if token.is_empty() || name.is_empty() || role.is_empty() {
                return Err(format!("Actor entry '{entry}' has an empty field"));
            }
            tokens.insert(token.to_string(), Actor::new(name, role));
        }
        Ok(ActorDirectory { tokens })
    }

    pub fn insert(&mut self, token: impl Into<String>, actor: Actor) {
        self.tokens.insert(token.into(), actor);
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Resolve a presented token. Every known token is compared so the
    /// lookup time does not depend on which one matched.
    pub fn authenticate(&self, presented: &str) -> Option<&Actor> {
        let mut found = None;
        for (token, actor) in &self.tokens {
            if constant_time_eq(token, presented) {
                found = Some(actor);
            }
        }
        found
    }
}

/// Generate a random 32-byte hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
