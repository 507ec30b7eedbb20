/// Asserts that the population holds exactly `count` fish.
#[macro_export]
macro_rules! assert_population {
    ($population:expr, $count:expr) => {
        assert_eq!(
            $population.fish().len(),
            $count,
            "Population count mismatch"
        );
    };
}

/// Asserts that a fish with the given id is no longer in the population.
#[macro_export]
macro_rules! assert_fish_gone {
    ($population:expr, $id:expr) => {
        let exists = $population.fish().iter().any(|f| f.id() == $id);
        assert!(!exists, "Fish {} should be gone but was found", $id);
    };
}

/// Asserts that every segment of every fish sits within `segment_length` of
/// its predecessor and every joint bends at most `max_bend_angle`.
#[macro_export]
macro_rules! assert_bodies_valid {
    ($population:expr) => {
        for fish in $population.fish() {
            let body = fish.body();
            for pair in body.segments().windows(2) {
                let gap = pair[0].distance_to(&pair[1]);
                assert!(
                    gap <= body.segment_length() + 1e-6,
                    "Fish {} segment gap {} exceeds {}",
                    fish.id(),
                    gap,
                    body.segment_length()
                );
            }
            for joint in 0..body.segments().len().saturating_sub(2) {
                let bend = body.joint_angle(joint).abs();
                assert!(
                    bend <= body.max_bend_angle() + 1e-6,
                    "Fish {} joint {} bends {}",
                    fish.id(),
                    joint,
                    bend
                );
            }
        }
    };
}
