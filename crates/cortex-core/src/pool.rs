//! Question pool assembly.
//!
//! Expands `Combined` at both levels in enumeration order, stamps each
//! question with where it came from, then shuffles the whole pool.

use rand::Rng;

use crate::content::ContentStore;
use crate::model::{Format, PooledQuestion, Region, Scope, System};

/// Collect matching questions in content order, stamped but not shuffled.
pub fn collect_questions(
    store: &ContentStore,
    region: Scope<Region>,
    system: Scope<System>,
    format: Format,
) -> Vec<PooledQuestion> {
    let mut pool = Vec::new();
    for r in region.expand() {
        for s in system.expand() {
            pool.extend(
                store
                    .questions(r, s, format)
                    .iter()
                    .cloned()
                    .map(|question| PooledQuestion {
                        question,
                        region: r,
                        system: s,
                    }),
            );
        }
    }
    pool
}

/// Build the shuffled pool for one quiz run.
pub fn build_question_pool<R: Rng + ?Sized>(
    store: &ContentStore,
    region: Scope<Region>,
    system: Scope<System>,
    format: Format,
    rng: &mut R,
) -> Vec<PooledQuestion> {
    let mut pool = collect_questions(store, region, system, format);
    shuffle(&mut pool, rng);
    tracing::debug!(
        size = pool.len(),
        %region,
        %system,
        %format,
        "question pool built"
    );
    pool
}

/// Fisher–Yates: for i from the last index down to 1, swap with a uniform j in [0, i].
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store() -> ContentStore {
        let mut store = ContentStore::default();
        for (i, region) in [Region::Forelimb, Region::Thorax, Region::Pelvis]
            .into_iter()
            .enumerate()
        {
            for system in [System::Osteology, System::Neurology] {
                for n in 0..4 {
                    store.insert_question(
                        region,
                        system,
                        Question::true_false(&format!("{region}-{system}-{i}-{n}"), n % 2 == 0, ""),
                    );
                }
            }
        }
        store.insert_question(
            Region::Forelimb,
            System::Osteology,
            Question::mcq("mcq only", &["a", "b"], 0, ""),
        );
        store
    }

    #[test]
    fn collect_follows_enumeration_order() {
        let store = store();
        let pool = collect_questions(&store, Scope::Combined, Scope::Combined, Format::TrueFalse);
        assert_eq!(pool.len(), 24);
        assert_eq!(pool[0].region, Region::Forelimb);
        assert_eq!(pool[0].system, System::Osteology);
        assert_eq!(pool[23].region, Region::Pelvis);
        assert_eq!(pool[23].system, System::Neurology);
        assert!(pool.iter().all(|q| q.format() == Format::TrueFalse));
    }

    #[test]
    fn shuffle_is_a_permutation_and_keeps_stamps() {
        let store = store();
        let before = collect_questions(&store, Scope::Combined, Scope::Combined, Format::TrueFalse);
        let mut rng = StdRng::seed_from_u64(7);
        let after = build_question_pool(
            &store,
            Scope::Combined,
            Scope::Combined,
            Format::TrueFalse,
            &mut rng,
        );
        assert_eq!(before.len(), after.len());

        let mut a: Vec<_> = before.iter().map(|q| q.question.prompt.clone()).collect();
        let mut b: Vec<_> = after.iter().map(|q| q.question.prompt.clone()).collect();
        assert_ne!(a, b, "seeded shuffle of 24 items should move something");
        a.sort();
        b.sort();
        assert_eq!(a, b);

        for q in &after {
            let expected = format!("{}-{}", q.region, q.system);
            assert!(q.question.prompt.starts_with(&expected));
        }
    }

    #[test]
    fn shuffle_handles_tiny_slices() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<u8> = vec![];
        shuffle(&mut empty, &mut rng);
        let mut one = vec![42];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![42]);
    }

    #[test]
    fn single_scope_only_pulls_that_section() {
        let store = store();
        let pool = collect_questions(
            &store,
            Scope::Only(Region::Forelimb),
            Scope::Only(System::Osteology),
            Format::Mcq,
        );
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].question.prompt, "mcq only");
    }
}
