use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::{Res, error::Error, types::NormalizedAlbum};

pub const DEFAULT_VERIFIER_LENGTH: usize = 64;
pub const MIN_VERIFIER_LENGTH: usize = 43;
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// Unreserved characters allowed in a PKCE code verifier.
pub const VERIFIER_ALPHABET: &[u8; 66] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

pub const ARTIST_DELIMITER: &str = ", ";

/// Generates a PKCE code verifier of exactly `length` characters.
///
/// Every character is an independent uniform draw from [`VERIFIER_ALPHABET`]
/// using the thread-local CSPRNG.
///
/// # Arguments
///
/// * `length` - Verifier length, between 43 and 128 inclusive
///
/// # Returns
///
/// - `Ok(String)` - The verifier
/// - `Err(Error::InvalidVerifierLength)` - `length` is out of range
///
/// # Example
///
/// ```
/// let verifier = generate_code_verifier(DEFAULT_VERIFIER_LENGTH)?;
/// let challenge = generate_code_challenge(&verifier);
/// assert_eq!(verifier.len(), 64);
/// assert_eq!(challenge.len(), 43);
/// ```
pub fn generate_code_verifier(length: usize) -> Res<String> {
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(Error::InvalidVerifierLength(length));
    }

    let mut rng = rand::rng();
    Ok((0..length)
        .map(|_| VERIFIER_ALPHABET[rng.random_range(0..VERIFIER_ALPHABET.len())] as char)
        .collect())
}

/// S256 code challenge: base64url(sha256(verifier)) without padding.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Picks `min(count, items.len())` distinct entries at random.
///
/// Each draw is uniform over the candidates not yet picked. The input slice
/// is left untouched and an empty input yields an empty result.
///
/// # Example
///
/// ```
/// let library = vec!["a", "b", "c", "d", "e"];
/// let picked = pick_random(&library, 3);
/// assert_eq!(picked.len(), 3);
/// assert_eq!(pick_random(&library, 10).len(), 5);
/// ```
pub fn pick_random<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    let mut rng = rand::rng();
    pick_random_with(items, count, |upper| rng.random_range(0..upper))
}

/// Same as [`pick_random`] but with the draws supplied by `draw`.
///
/// `draw(n)` must return an index in `0..n`; it is called once per picked
/// element with the number of candidates still remaining. Out of range
/// values are wrapped into range.
pub fn pick_random_with<T, F>(items: &[T], count: usize, mut draw: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(usize) -> usize,
{
    let mut remaining: Vec<T> = items.to_vec();
    let take = count.min(remaining.len());
    let mut chosen = Vec::with_capacity(take);

    for _ in 0..take {
        let index = draw(remaining.len()) % remaining.len();
        chosen.push(remaining.remove(index));
    }

    chosen
}

/// Joins artist names with [`ARTIST_DELIMITER`], skipping empty names.
pub fn join_artists<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(ARTIST_DELIMITER)
}

pub fn pick_random_albums(library: &[NormalizedAlbum], count: usize) -> Vec<NormalizedAlbum> {
    pick_random(library, count)
}
