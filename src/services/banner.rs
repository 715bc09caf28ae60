//! Banners for the sign-in screens.

use rand::seq::SliceRandom;

/// Stacked pages
const PAGES: &str = r#"
      ┌───────────┐
      │ ▀▀▀▀▀▀▀▀  │┐
      │ ▀▀▀▀▀▀    ││┐
      │ ▀▀▀▀▀▀▀▀▀ │││
      │ ▀▀▀▀      │││
      └───────────┘││
       └───────────┘│
        └───────────┘

        d o c c h a t
"#;

/// A document with a speech bubble
const ASK: &str = r#"
     ┌─────────┐   ╭──────────╮
     │ ≡≡≡≡≡≡  │   │  ask me  │
     │ ≡≡≡≡    │ ◀─┤ anything │
     │ ≡≡≡≡≡≡≡ │   ╰──────────╯
     │ ≡≡≡     │
     └─────────┘

        d o c c h a t
"#;

/// Magnifier over text
const LENS: &str = r#"
      ▄▄▄▄▄▄▄▄▄▄▄▄▄▄▄▄
      █ ░░░░ ░░ ░░░░ █
      █ ░░ ╭────╮ ░░ █
      █ ░░ │ ?? │ ░░ █
      █ ░░ ╰────╯╲░░ █
      ▀▀▀▀▀▀▀▀▀▀▀▀╲▀▀▀
                   ╲

        d o c c h a t
"#;

/// All available banners.
const BANNERS: &[&str] = &[PAGES, ASK, LENS];

/// Tagline shown under the banner.
pub const TAGLINE: &str = "Upload a document. Ask it anything.";

/// Returns a randomly selected banner.
pub fn random_banner() -> &'static str {
    let mut rng = rand::thread_rng();
    BANNERS.choose(&mut rng).copied().unwrap_or(PAGES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_banner_is_one_of_ours() {
        for _ in 0..10 {
            assert!(BANNERS.contains(&random_banner()));
        }
    }
}
