/// Asserts that an organism with the given id has more than the given energy.
#[macro_export]
macro_rules! assert_energy_above {
    ($world:expr, $id:expr, $min_energy:expr) => {
        let organism = $world.organism($id).expect("Organism not found in world");
        assert!(
            organism.vitals.energy > $min_energy,
            "Organism {} energy {} is not above {}",
            $id,
            organism.vitals.energy,
            $min_energy
        );
    };
}

/// Asserts that an organism with the given id is no longer in the population.
#[macro_export]
macro_rules! assert_organism_dead {
    ($world:expr, $id:expr) => {
        assert!(
            $world.organism($id).is_none(),
            "Organism {} should be dead but was found alive",
            $id
        );
    };
}

/// Asserts that the population count matches the expected value.
#[macro_export]
macro_rules! assert_population {
    ($world:expr, $count:expr) => {
        assert_eq!($world.population(), $count, "Population count mismatch");
    };
}
