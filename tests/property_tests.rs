use proptest::prelude::*;

use dacdict::Dict;

proptest! {
    #[test]
    fn roundtrip_u64(vals in prop::collection::vec(any::<u64>(), 0..300)) {
        let dict = Dict::from_slice(&vals).unwrap();
        prop_assert_eq!(dict.len(), vals.len());
        for (k, &want) in vals.iter().enumerate() {
            prop_assert_eq!(dict.get_u64(k).unwrap(), want);
        }
        prop_assert_eq!(dict.to_u64_vec(), vals);
    }

    #[test]
    fn roundtrip_i64(vals in prop::collection::vec(any::<i64>(), 1..200)) {
        let mut dict = Dict::new();
        for &v in &vals {
            dict.push_i64(v);
        }
        dict.close();
        for (k, &want) in vals.iter().enumerate() {
            prop_assert_eq!(dict.get_i64(k).unwrap(), want);
        }
    }

    #[test]
    fn roundtrip_f64(vals in prop::collection::vec(any::<f64>(), 1..200)) {
        let mut dict = Dict::new();
        dict.extend_f64s(&vals);
        dict.close();
        for (k, &want) in vals.iter().enumerate() {
            // Bitwise comparison keeps NaN payloads honest.
            prop_assert_eq!(dict.get_f64(k).unwrap().to_bits(), want.to_bits());
        }
    }

    #[test]
    fn iterator_matches_reads(vals in prop::collection::vec(any::<u64>(), 0..300)) {
        let dict = Dict::from_slice(&vals).unwrap();
        let pairs: Vec<(usize, u64)> = dict.iter().collect();
        let want: Vec<(usize, u64)> = vals.iter().copied().enumerate().collect();
        prop_assert_eq!(pairs, want);
    }

    #[test]
    fn removals_match_vec_model(
        vals in prop::collection::vec(any::<u64>(), 1..150),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..100),
    ) {
        let mut model = vals.clone();
        let mut dict = Dict::from_slice(&vals).unwrap();
        for pick in picks {
            if model.is_empty() {
                break;
            }
            let k = pick.index(model.len());
            model.remove(k);
            dict.remove_at(k).unwrap();
        }
        prop_assert_eq!(dict.len(), model.len());
        prop_assert_eq!(dict.to_u64_vec(), model);
    }

    #[test]
    fn updates_match_vec_model(
        vals in prop::collection::vec(any::<u64>(), 1..150),
        edits in prop::collection::vec((any::<prop::sample::Index>(), any::<u64>()), 0..100),
    ) {
        let mut model = vals.clone();
        let mut dict = Dict::from_slice(&vals).unwrap();
        for (pick, x) in edits {
            let k = pick.index(model.len());
            model[k] = x;
            dict.update_at(k, x).unwrap();
        }
        prop_assert_eq!(dict.to_u64_vec(), model.clone());
        for (k, &want) in model.iter().enumerate() {
            prop_assert_eq!(dict.get_u64(k).unwrap(), want);
        }
    }

    #[test]
    fn interleaved_mutations_match_vec_model(
        vals in prop::collection::vec(any::<u64>(), 1..100),
        ops in prop::collection::vec(
            (any::<bool>(), any::<prop::sample::Index>(), any::<u64>()),
            0..80,
        ),
    ) {
        let mut model = vals.clone();
        let mut dict = Dict::from_slice(&vals).unwrap();
        for (is_remove, pick, x) in ops {
            if model.is_empty() {
                break;
            }
            let k = pick.index(model.len());
            if is_remove {
                model.remove(k);
                dict.remove_at(k).unwrap();
            } else {
                model[k] = x;
                dict.update_at(k, x).unwrap();
            }
        }
        prop_assert_eq!(dict.to_u64_vec(), model);
    }

    #[test]
    fn scan_returns_first_occurrence(
        vals in prop::collection::vec(0u64..1000, 1..120),
        probe in 0u64..1000,
    ) {
        let dict = Dict::from_slice(&vals).unwrap();
        prop_assert_eq!(dict.scan(probe), vals.iter().position(|&v| v == probe));
    }

    #[test]
    fn search_matches_sorted_model(
        mut vals in prop::collection::vec(any::<u64>(), 1..150),
        probe in any::<u64>(),
    ) {
        vals.sort_unstable();
        let dict = Dict::from_slice(&vals).unwrap();

        for &v in &vals {
            let first = vals.iter().position(|&w| w == v).unwrap();
            let count = vals.iter().filter(|&&w| w == v).count();
            prop_assert_eq!(dict.search(v), Some((first, count)));
        }
        if !vals.contains(&probe) {
            prop_assert_eq!(dict.search(probe), None);
        }
    }
}
