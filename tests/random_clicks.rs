use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use slice_share::{Action, Config, CostSplit, Session};

#[test]
fn random_sessions_end_fully_allocated() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let persons = rng.gen_range(1..=6);
        let slices_per_person = rng.gen_range(1..=4);
        let mut session = Session::new(Config { persons, slices_per_person, ..Config::default() }).unwrap();
        let len = session.segments().len();

        let mut clicks = 0;
        while !session.all_assigned() {
            clicks += 1;
            assert!(clicks < 10_000, "session never filled");
            if let Err(err) = session.act(Action::Pick(rng.gen_range(0..len))) {
                assert!(err.is_silent(), "unexpected error {err}");
            }
        }

        let snapshot = session.recompute();
        let percent: f64 = snapshot.participants.iter().map(|p| p.percentage).sum();
        assert!((percent - 100.0).abs() < 1e-9);
        let owned: usize = snapshot.participants.iter().map(|p| p.indices.len()).sum();
        assert_eq!(owned, len);
        match snapshot.costs {
            CostSplit::Allocated { price, shares } => {
                assert!((shares.values().sum::<f64>() - price).abs() < 1e-9);
            }
            other => panic!("{persons}x{slices_per_person}: expected allocation, got {other:?}"),
        }
    }
}
