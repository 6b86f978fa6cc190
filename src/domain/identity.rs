//! Random identity material baked into each build: guest credentials,
//! computer names, MAC addresses and scheduled-task names all come from
//! here so that no two images share recognizable markers.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Random alphanumeric string. Drawn from the thread-local CSPRNG
/// since some of these end up as guest passwords.
pub fn random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Random MAC address in the locally administered 02:00:00 prefix,
/// formatted without separators the way VirtualBox expects it.
pub fn random_mac() -> String {
    let mut rng = rand::rng();
    format!(
        "020000{:02x}{:02x}{:02x}",
        rng.random::<u8>(),
        rng.random::<u8>(),
        rng.random::<u8>()
    )
}
