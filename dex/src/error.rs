use anyhow::Error;
use pokedex::prelude::PokedexError;

/// Exit status: 2 for bad input (unknown id, invalid page or reference), 1 otherwise.
pub fn exit_code(err: &Error) -> i32 {
    if matches!(
        err.downcast_ref::<PokedexError>(),
        Some(
            PokedexError::NotFound { .. }
                | PokedexError::InvalidReference { .. }
                | PokedexError::PageOutOfRange { .. }
        )
    ) {
        return 2;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_exits_with_2() {
        let err = Error::new(PokedexError::PageOutOfRange {
            requested: 9,
            total_pages: 2,
        });
        assert_eq!(exit_code(&err), 2);

        let err = Error::new(PokedexError::Other {
            message: "boom".into(),
        });
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("plain")), 1);
    }
}
