//! Property tests for ticket status derivation.

use atendimentos_core::{derive_status, derive_status_from_labels, MotiveStatus, TicketStatus};
use atendimentos_testing::properties::{motive_status, statuses_and_permutation};
use proptest::prelude::*;

proptest! {
    #[test]
    fn any_permutation_yields_the_same_status((statuses, permuted) in statuses_and_permutation(16)) {
        prop_assert_eq!(derive_status(statuses), derive_status(permuted));
    }

    #[test]
    fn duplicates_do_not_matter(statuses in prop::collection::vec(motive_status(), 1..8)) {
        let doubled: Vec<MotiveStatus> = statuses.iter().chain(statuses.iter()).copied().collect();
        prop_assert_eq!(derive_status(statuses), derive_status(doubled));
    }

    #[test]
    fn labels_agree_with_typed_statuses(statuses in prop::collection::vec(motive_status(), 0..8)) {
        let labels: Vec<&str> = statuses.iter().map(MotiveStatus::as_str).collect();
        prop_assert_eq!(derive_status_from_labels(labels), derive_status(statuses));
    }

    #[test]
    fn empty_only_when_no_items(statuses in prop::collection::vec(motive_status(), 0..8)) {
        let empty = statuses.is_empty();
        prop_assert_eq!(derive_status(statuses) == TicketStatus::SemItens, empty);
    }

    #[test]
    fn derivation_is_never_cancelled(statuses in prop::collection::vec(motive_status(), 0..12)) {
        prop_assert_ne!(derive_status(statuses), TicketStatus::Cancelado);
    }

    #[test]
    fn terminal_iff_all_items_terminal(statuses in prop::collection::vec(motive_status(), 1..12)) {
        let all_terminal = statuses.iter().all(MotiveStatus::is_terminal);
        prop_assert_eq!(derive_status(statuses).is_terminal(), all_terminal);
    }
}
