//! Property tests for symbol validation and batch fetching

use proptest::prelude::*;
use quanta_watch::fetch::BatchFetcher;
use quanta_watch::quote::{MockQuoteClient, QuoteError};
use quanta_watch::symbol::{validate, InvalidSymbolError, Symbol};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Behaviour {
    Quote,
    NotFound,
    RateLimited,
    Unauthorized,
    Transient,
}

fn arb_behaviour() -> impl Strategy<Value = Behaviour> {
    prop_oneof![
        Just(Behaviour::Quote),
        Just(Behaviour::NotFound),
        Just(Behaviour::RateLimited),
        Just(Behaviour::Unauthorized),
        Just(Behaviour::Transient),
    ]
}

fn sym(raw: &str) -> Symbol {
    validate(raw).unwrap()
}

fn client_for(behaviours: &HashMap<String, Behaviour>) -> MockQuoteClient {
    behaviours
        .iter()
        .fold(MockQuoteClient::new(), |client, (ticker, behaviour)| {
            let symbol = sym(ticker);
            match behaviour {
                Behaviour::Quote => client.with_quote(symbol, format!("{ticker} Corp"), 10.0, 0.5, 5.0),
                Behaviour::NotFound => client.with_failure(symbol.clone(), QuoteError::NotFound(symbol)),
                Behaviour::RateLimited => client.with_failure(symbol, QuoteError::RateLimited),
                Behaviour::Unauthorized => client.with_failure(symbol, QuoteError::Unauthorized),
                Behaviour::Transient => {
                    client.with_failure(symbol, QuoteError::Transient("connection reset".into()))
                }
            }
        })
}

proptest! {
    #[test]
    fn letters_up_to_five_are_accepted_uppercased(raw in "[A-Za-z]{1,5}") {
        let symbol = validate(&raw).unwrap();
        prop_assert_eq!(symbol.as_str(), raw.to_ascii_uppercase());
    }

    #[test]
    fn surrounding_whitespace_is_ignored(pad in "[ \t]{0,3}", raw in "[A-Za-z]{1,5}") {
        let padded = format!("{pad}{raw}{pad}");
        prop_assert_eq!(validate(&padded).unwrap(), validate(&raw).unwrap());
    }

    #[test]
    fn more_than_five_letters_are_rejected(raw in "[A-Za-z]{6,12}") {
        prop_assert_eq!(validate(&raw), Err(InvalidSymbolError::TooLong(raw.clone())));
    }

    #[test]
    fn non_letters_are_rejected(raw in "[A-Za-z]{0,2}[0-9.$/-][A-Za-z0-9.$/-]{0,2}") {
        let is_invalid_character = matches!(
            validate(&raw),
            Err(InvalidSymbolError::InvalidCharacter { .. })
        );
        prop_assert!(is_invalid_character);
    }

    #[test]
    fn fetch_all_reports_every_requested_symbol_once(
        requested in prop::collection::vec("[A-D]{1,2}", 0..24),
        behaviours in prop::collection::hash_map("[A-D]{1,2}", arb_behaviour(), 0..12),
    ) {
        let client = Arc::new(client_for(&behaviours));
        let fetcher = BatchFetcher::new(client.clone());
        let symbols: Vec<Symbol> = requested.iter().map(|raw| sym(raw)).collect();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let outcome = runtime.block_on(fetcher.fetch_all(&symbols));

        let expected: BTreeSet<Symbol> = symbols.iter().cloned().collect();
        let reported: BTreeSet<Symbol> = outcome.symbols().cloned().collect();
        prop_assert_eq!(&reported, &expected);
        prop_assert_eq!(outcome.len(), expected.len());
        prop_assert_eq!(client.calls(), expected.len());

        for symbol in &expected {
            let succeeded = matches!(behaviours.get(symbol.as_str()), Some(Behaviour::Quote));
            let result = outcome.get(symbol).unwrap();
            prop_assert_eq!(result.is_ok(), succeeded, "unexpected result for {}", symbol);
        }
        prop_assert_eq!(
            outcome.success_count() + outcome.failure_count(),
            expected.len()
        );
        prop_assert_eq!(outcome.is_total_failure(), outcome.success_count() == 0 && !expected.is_empty());
    }
}
