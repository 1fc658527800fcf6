//! Command implementations for the SchroKV CLI.

use application::ChaosKvStore;
use chrono::Utc;
use futures::TryStreamExt;
use tracing::warn;

/// Canonical seed records
const SEED_DATA: &[(&str, &str)] = &[("cat", "meow"), ("dog", "woof"), ("bird", "tweet")];

/// Print the note left by a corrupted operation, if the store lied just now
pub fn print_chaos_note(store: &ChaosKvStore) {
    if let Some(event) = store.last_event() {
        println!("(chaos: {event})");
    }
}

/// Fetch and print the value for a key, returning the process exit code
///
/// A failed get reports on stdout and yields a nonzero code instead of
/// aborting, so the caller can still tear down the database pool.
pub async fn run_get(store: &ChaosKvStore, key: &str) -> i32 {
    match store.get(key).await {
        Ok(value) => {
            println!("Value for key '{key}': {value}");
            print_chaos_note(store);
            0
        },
        Err(e) => {
            println!("Get error: {e}");
            1
        },
    }
}

/// Print the true backend state and return the record count
pub async fn run_dump(store: &ChaosKvStore) -> anyhow::Result<usize> {
    println!("True backend state (dump):");
    println!("===");

    let mut stream = store.dump();
    let mut count = 0_usize;
    while let Some(record) = stream.try_next().await? {
        println!("{record}");
        count += 1;
    }

    if count == 0 {
        println!("Store is empty");
    } else {
        println!("\nTotal entries: {count}");
    }
    Ok(count)
}

/// Insert the canonical seed records through the chaotic store
pub async fn run_seed(store: &ChaosKvStore) -> anyhow::Result<()> {
    println!("Seeding the store");
    println!("===");

    for (key, value) in SEED_DATA {
        store.put(key, value).await?;
        print_chaos_note(store);
    }

    println!("Seeding complete.");
    Ok(())
}

/// Guided walk-through: puts, gets, deletes, then the ground truth
pub async fn run_demo(store: &ChaosKvStore) -> anyhow::Result<()> {
    println!("===");
    println!("SchroKV demo");
    println!("===");

    let test_data = [
        ("cat", "meow"),
        ("dog", "woof"),
        ("bird", "tweet"),
        ("fish", "blub"),
        ("cow", "moo"),
    ];

    println!("\n#1. Put operations:");
    for (key, value) in test_data {
        println!("Putting {key} = {value}");
        if let Err(e) = store.put(key, value).await {
            println!("Put error for {key}: {e}");
        }
        print_chaos_note(store);
    }

    println!("\n#2. Get operations:");
    for (key, _) in test_data {
        match store.get(key).await {
            Ok(value) => println!("Get({key}): {value}"),
            Err(e) => println!("Get({key}): error - {e}"),
        }
    }

    println!("\n#3. Delete operations:");
    for key in ["cat", "fish"] {
        println!("Deleting {key}");
        if let Err(e) = store.delete(key).await {
            println!("Delete error for {key}: {e}");
        }
        print_chaos_note(store);
    }

    println!("\n#4. Ground truth after the dust settles:");
    run_dump(store).await?;

    println!("\n#5. Getting the deleted keys:");
    for key in ["cat", "fish"] {
        match store.get(key).await {
            Ok(value) => println!("Get({key}): {value} (chaos may have answered for another key)"),
            Err(e) => println!("Get({key}): error - {e}"),
        }
    }

    let stats = store.stats();
    println!(
        "\nChaos fired on {} of {} operations ({:.0}%)",
        stats.chaos_fired,
        stats.total_operations,
        stats.observed_chaos_rate() * 100.0
    );
    Ok(())
}

/// Mutate one uniformly random record through the chaotic store
///
/// A quiet no-op when the store is empty.
pub async fn mutate_random_record(store: &ChaosKvStore) -> anyhow::Result<()> {
    let key = match store.sample_random_key().await {
        Ok(key) => key,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let value = format!("mutated_{}", Utc::now().timestamp_nanos_opt().unwrap_or(0));
    store.put(&key, &value).await?;
    println!("Value for key '{key}' mutated to '{value}'");
    print_chaos_note(store);
    Ok(())
}

/// Periodically mutate random records until interrupted
pub async fn run_watch(store: &ChaosKvStore, interval_secs: u64) -> anyhow::Result<()> {
    println!("Store is running... (Ctrl+C to exit)");

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
    ticker.tick().await; // First tick fires immediately

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                println!("Store is still alive...");
                if let Err(e) = mutate_random_record(store).await {
                    warn!("random mutation failed: {e}");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down");
                return Ok(());
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::{ChaosEngine, ChaosPolicy};
    use infrastructure::{AsyncDatabase, SqlxKvBackend};
    use std::sync::Arc;

    async fn honest_store() -> ChaosKvStore {
        let db = AsyncDatabase::in_memory().await.unwrap();
        db.migrate().await.unwrap();
        let backend = Arc::new(SqlxKvBackend::new(&db));
        ChaosKvStore::new(backend, ChaosEngine::new(ChaosPolicy::never()))
    }

    #[tokio::test]
    async fn get_reports_success_and_failure_via_exit_code() {
        let store = honest_store().await;
        store.put("cat", "meow").await.unwrap();

        assert_eq!(run_get(&store, "cat").await, 0);
        assert_eq!(run_get(&store, "ghost").await, 1);
    }

    #[tokio::test]
    async fn seed_inserts_the_canonical_records() {
        let store = honest_store().await;
        run_seed(&store).await.unwrap();

        assert_eq!(store.get("cat").await.unwrap(), "meow");
        assert_eq!(store.get("dog").await.unwrap(), "woof");
        assert_eq!(store.get("bird").await.unwrap(), "tweet");
    }

    #[tokio::test]
    async fn dump_reports_the_record_count() {
        let store = honest_store().await;
        assert_eq!(run_dump(&store).await.unwrap(), 0);

        run_seed(&store).await.unwrap();
        assert_eq!(run_dump(&store).await.unwrap(), SEED_DATA.len());
    }

    #[tokio::test]
    async fn mutate_random_record_on_empty_store_is_a_noop() {
        let store = honest_store().await;
        mutate_random_record(&store).await.unwrap();
        assert_eq!(run_dump(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mutate_random_record_rewrites_an_existing_value() {
        let store = honest_store().await;
        store.put("cat", "meow").await.unwrap();

        mutate_random_record(&store).await.unwrap();

        let value = store.get("cat").await.unwrap();
        assert!(value.starts_with("mutated_"), "value was '{value}'");
    }

    #[tokio::test]
    async fn demo_runs_to_completion_without_chaos() {
        let store = honest_store().await;
        run_demo(&store).await.unwrap();

        // cat and fish were deleted by the walk-through
        assert!(store.get("cat").await.unwrap_err().is_not_found());
        assert!(store.get("dog").await.is_ok());
    }
}
