//! Cipher-constraint matchers.
//!
//! A matcher is one half of the coupled search: it decides, for each
//! candidate plaintext character, whether committing it is consistent with
//! every plaintext/ciphertext pair committed so far under the cipher's
//! structural rules. All matchers share one contract:
//!
//! - [`Matcher::push`] commits the next plaintext character (cheap,
//!   reversible), returning whether it is consistent;
//! - [`Matcher::pop`] undoes the matching push exactly;
//! - [`Matcher::test`] runs after each successful push and drives the
//!   continuation — most ciphers just continue, Playfair uses it to harden
//!   committed text against an actual key square;
//! - [`Matcher::key`] renders the recovered key, where one exists.
//!
//! Each matcher is constructed over the ciphertext and tracks its own
//! committed position, so the search never threads text through the calls.
//! Matchers are value types: every worker thread clones its own.

mod chaotic;
mod playfair;
mod simple;

pub use chaotic::Chaotic;
pub use playfair::Playfair;
pub use simple::{Bigram, Pelling, Simple};

/// The uniform matcher contract. Implementations are monomorphized into the
/// search; no state is shared between matcher variants.
pub trait Matcher: Clone + Send {
    /// Try to commit the next plaintext character. Must be reversible via
    /// [`Matcher::pop`] and must leave the matcher untouched on rejection.
    fn push(&mut self, ch: u8) -> bool;

    /// Undo the most recent successful push of `ch`.
    fn pop(&mut self, ch: u8);

    /// Run the continuation, optionally validating expensive whole-text
    /// constraints first. The continuation may be invoked several times
    /// (once per surviving key configuration).
    fn test(&mut self, next: &mut dyn FnMut(&mut Self)) {
        next(self)
    }

    /// Displayable key; empty when the cipher has no compact key form.
    fn key(&self) -> String {
        String::new()
    }
}

/// Matchers index per-character tables by raw byte; anything outside the
/// 7-bit range can never match.
#[inline]
pub(crate) fn in_alphabet(ch: u8) -> bool {
    ch < 128
}
