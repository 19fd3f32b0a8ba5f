//! Tests for the common value types: words, logical addresses and errors.

use os_simulator::common::{ErrorKind, LogicalAddress, SimError, Word};
use os_simulator::kernel::ProcessId;
use proptest::prelude::*;

/// Tests word parsing with and without the hex prefix.
#[test]
fn test_word_parse() {
    assert_eq!("0x00000008".parse::<Word>().unwrap(), Word::new(8));
    assert_eq!("C050005C".parse::<Word>().unwrap(), Word::new(0xC050_005C));
    assert!("0xZZ".parse::<Word>().is_err());
}

/// Tests the eight-digit word rendering.
#[test]
fn test_word_display() {
    assert_eq!(Word::new(8).to_string(), "0x00000008");
    assert_eq!(Word::new(0xdead_beef).to_string(), "0xdeadbeef");
}

/// Tests conversion between register values and words.
#[test]
fn test_word_register_conversion() {
    assert_eq!(Word::from_register(8).raw(), 8);
    assert_eq!(Word::from_register(-1).raw(), 0xffff_ffff);
    assert_eq!(Word::new(0xffff_ffff).to_register(), 0xffff_ffff);
}

/// Tests translation at page boundaries.
#[test]
fn test_translate_boundaries() {
    let a = LogicalAddress::translate(0, 4);
    assert_eq!((a.page_number(), a.page_offset()), (0, 0));
    let a = LogicalAddress::translate(3, 4);
    assert_eq!((a.page_number(), a.page_offset()), (0, 3));
    let a = LogicalAddress::translate(4, 4);
    assert_eq!((a.page_number(), a.page_offset()), (1, 0));
    let a = LogicalAddress::translate(71, 4);
    assert_eq!((a.page_number(), a.page_offset()), (17, 3));
}

/// Tests that process context wraps once and keeps the error kind.
#[test]
fn test_error_process_context() {
    let err = SimError::DivideByZero.in_process(ProcessId::new(3), 7);
    assert_eq!(err.kind(), ErrorKind::Execution);
    let rewrapped = err.in_process(ProcessId::new(4), 9);
    match rewrapped {
        SimError::Process { pid, pc, .. } => {
            assert_eq!(pid, ProcessId::new(3));
            assert_eq!(pc, 7);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

proptest! {
    /// Tests that translation splits an address into quotient and remainder.
    #[test]
    fn prop_translate_round_trips(address in 0usize..1_000_000, page_size in 1usize..64) {
        let addr = LogicalAddress::translate(address, page_size);
        prop_assert_eq!(addr.page_number(), address / page_size);
        prop_assert_eq!(addr.page_offset(), address % page_size);
        prop_assert_eq!(addr.page_number() * page_size + addr.page_offset(), address);
        prop_assert_eq!(addr.to_linear(page_size), address);
    }
}
