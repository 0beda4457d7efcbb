use mock_dispatch::CallbackGate;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_gate_fires_on_first_admitted_calls(
        modulus in 1usize..5,
        limit in 0usize..6,
        calls in 0usize..40,
    ) {
        let gate = CallbackGate::always().when(move |i| i % modulus == 0).for_times(limit);
        let fired: Vec<usize> = (0..calls).filter(|&i| gate.try_pass(i).is_some()).collect();
        let expected: Vec<usize> = (0..calls).filter(|i| i % modulus == 0).take(limit).collect();

        prop_assert_eq!(fired, expected);
        prop_assert_eq!(gate.matching_count(), (0..calls).filter(|i| i % modulus == 0).count());
    }

    #[test]
    fn test_only_mirrors_for_times(limit in 0usize..10, calls in 0usize..30) {
        let for_times = CallbackGate::always().for_times(limit);
        let only = CallbackGate::always().only(limit);
        for i in 0..calls {
            prop_assert_eq!(for_times.try_pass(i), only.try_pass(i));
        }
    }
}
