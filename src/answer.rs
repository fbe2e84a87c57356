//! Guess evaluation against a round's accepted answers.

use crate::normalize::normalize;

/// True iff the normalized guess exactly equals any normalized accepted
/// answer. No substring matching and no edit-distance tolerance. An empty
/// guess is evaluated like any other and fails unless the empty string is
/// itself an accepted answer.
pub fn is_correct(accepted: &[String], guess: &str) -> bool {
    let guess = normalize(guess);
    accepted.iter().any(|answer| normalize(answer) == guess)
}
