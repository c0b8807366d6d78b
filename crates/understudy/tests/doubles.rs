//! Generated proxies under each behavior

#![cfg(feature = "derive")]
#![allow(clippy::unwrap_used)]

use futures::executor::block_on;
use futures::StreamExt;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use understudy::prelude::*;

#[double(name = "IRepo")]
pub trait Repo: Send + Sync {
    fn find(&self, id: u32) -> Option<String>;

    fn count(&self) -> usize;

    fn save(&self, name: &str);

    fn try_parse(&self, text: &str, #[understudy(out)] parsed: &mut i32) -> bool;

    fn bump(&self, counter: &mut u32);

    #[understudy(get)]
    fn limit(&self) -> u32;

    #[understudy(set)]
    fn set_limit(&self, value: u32);

    #[understudy(get, property = "item")]
    fn item(&self, index: usize) -> String;

    fn load(&self, id: u32) -> BoxFuture<'_, Option<String>>;

    fn flush(&self) -> BoxFuture<'_, ()>;

    fn names(&self) -> BoxStream<'_, String>;
}

#[double(name = "ISearch")]
pub trait Search: Send + Sync {
    fn find(&self, filter: Option<&str>, limit: usize) -> usize;

    fn each(&self, visit: &dyn Fn(u32));
}

struct RealSearch;

impl Search for RealSearch {
    fn find(&self, filter: Option<&str>, limit: usize) -> usize {
        filter.map_or(0, str::len).min(limit)
    }

    fn each(&self, visit: &dyn Fn(u32)) {
        (0..3).for_each(visit);
    }
}

/// Real implementation counting the calls that reach it
#[derive(Default)]
struct RealRepo {
    calls: Arc<AtomicUsize>,
}

impl RealRepo {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Repo for RealRepo {
    fn find(&self, id: u32) -> Option<String> {
        self.hit();
        Some(format!("real-{id}"))
    }

    fn count(&self) -> usize {
        self.hit();
        100
    }

    fn save(&self, _name: &str) {
        self.hit();
    }

    fn try_parse(&self, text: &str, parsed: &mut i32) -> bool {
        self.hit();
        match text.parse() {
            Ok(value) => {
                *parsed = value;
                true
            }
            Err(_) => false,
        }
    }

    fn bump(&self, counter: &mut u32) {
        self.hit();
        *counter += 1;
    }

    fn limit(&self) -> u32 {
        self.hit();
        10
    }

    fn set_limit(&self, _value: u32) {
        self.hit();
    }

    fn item(&self, index: usize) -> String {
        self.hit();
        format!("real item {index}")
    }

    fn load(&self, id: u32) -> BoxFuture<'_, Option<String>> {
        self.hit();
        Box::pin(async move { Some(format!("loaded-{id}")) })
    }

    fn flush(&self) -> BoxFuture<'_, ()> {
        self.hit();
        Box::pin(async {})
    }

    fn names(&self) -> BoxStream<'_, String> {
        self.hit();
        Box::pin(futures::stream::iter(vec!["real".to_string()]))
    }
}

fn mock(behavior: Behavior) -> MockedDependency<dyn Repo> {
    MockFactory::new().create::<dyn Repo>(behavior).unwrap()
}

fn decorated(behavior: Behavior) -> (MockedDependency<dyn Repo>, Arc<AtomicUsize>) {
    let real = RealRepo::default();
    let calls = Arc::clone(&real.calls);
    let dependency = MockFactory::new()
        .decorate::<dyn Repo>(Arc::new(real), behavior)
        .unwrap();
    (dependency, calls)
}

// ============================================================================
// Permissive
// ============================================================================

#[test]
fn test_permissive_yields_zero_values() {
    let repo = mock(Behavior::Permissive);
    let instance = repo.instance();

    assert_eq!(instance.find(1), None);
    assert_eq!(instance.count(), 0);
    instance.save("ada");
    assert_eq!(instance.limit(), 0);
    assert_eq!(instance.item(3), "");
    assert_eq!(block_on(instance.load(1)), None);
    block_on(instance.flush());
    assert!(block_on(instance.names().collect::<Vec<_>>()).is_empty());
}

#[test]
fn test_return_round_trip() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements().method("count").unwrap().returns(3usize);

    assert_eq!(repo.instance().count(), 3);
    assert_eq!(repo.instance().count(), 3);
}

#[test]
fn test_arguments_select_arrangement() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements()
        .method("find")
        .unwrap()
        .with_arg("id", 7u32)
        .returns(Some("ada".to_string()));

    assert_eq!(repo.instance().find(7), Some("ada".to_string()));
    assert_eq!(repo.instance().find(8), None);
}

#[test]
fn test_borrowed_arguments_are_matched_owned() {
    let repo = mock(Behavior::Permissive);
    let saved = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&saved);
    repo.arrangements()
        .method("save")
        .unwrap()
        .with_arg("name", "ada".to_string())
        .invokes(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .register();

    repo.instance().save("ada");
    repo.instance().save("bob");
    assert_eq!(saved.load(Ordering::SeqCst), 1);
}

#[test]
fn test_out_parameter_fidelity() {
    let repo = mock(Behavior::Permissive);
    let mut parsed = 99;
    assert!(!repo.instance().try_parse("7", &mut parsed));
    assert_eq!(parsed, 0);

    repo.arrangements()
        .method("try_parse")
        .unwrap()
        .sets_out("parsed", 7i32)
        .returns(true);

    let mut parsed = 0;
    assert!(repo.instance().try_parse("anything", &mut parsed));
    assert_eq!(parsed, 7);
}

#[test]
fn test_ref_parameter_fidelity() {
    let repo = mock(Behavior::Permissive);
    let mut counter = 0;
    repo.instance().bump(&mut counter);
    assert_eq!(counter, 0);

    let mut counter = 3;
    repo.instance().bump(&mut counter);
    assert_eq!(counter, 3);

    repo.arrangements()
        .method("bump")
        .unwrap()
        .sets_ref("counter", 7u32)
        .does_nothing();
    repo.instance().bump(&mut counter);
    assert_eq!(counter, 7);
}

#[test]
fn test_callback_sees_ref_value() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements()
        .method("bump")
        .unwrap()
        .invokes(|call| {
            let current = *call.ref_arg::<u32>("counter").unwrap();
            call.ref_parameters_mut()
                .unwrap()
                .set("counter", current * 2)
                .unwrap();
        })
        .register();

    let mut counter = 21;
    repo.instance().bump(&mut counter);
    assert_eq!(counter, 42);
}

#[test]
fn test_getter_read_twice_intercepted_twice() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements().getter("limit").unwrap().returns(42u32);

    assert_eq!(repo.instance().limit(), 42);
    assert_eq!(repo.instance().limit(), 42);
    assert_eq!(repo.journal().count(), 2);
}

#[test]
fn test_setter_matches_assigned_value() {
    let repo = mock(Behavior::Permissive);
    let assigned = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&assigned);
    repo.arrangements()
        .setter("limit")
        .unwrap()
        .with_setter_value(5u32)
        .invokes(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .register();

    repo.instance().set_limit(5);
    repo.instance().set_limit(6);
    assert_eq!(assigned.load(Ordering::SeqCst), 1);
}

#[test]
fn test_indexer_getter_uses_index_argument() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements()
        .getter("item")
        .unwrap()
        .with_arg("index", 3usize)
        .returns("three".to_string());

    assert_eq!(repo.instance().item(3), "three");
    assert_eq!(repo.instance().item(4), "");
}

#[test]
fn test_duplicate_registration_applies_once() {
    let repo = mock(Behavior::Permissive);
    let applied = Arc::new(AtomicUsize::new(0));
    for value in [1usize, 2] {
        let applied = Arc::clone(&applied);
        repo.arrangements()
            .method("count")
            .unwrap()
            .invokes(move |_| {
                applied.fetch_add(1, Ordering::SeqCst);
            })
            .returns(value);
    }

    assert_eq!(repo.instance().count(), 1);
    assert_eq!(applied.load(Ordering::SeqCst), 1);
}

#[test]
fn test_predicate_may_call_the_same_dependency() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements().method("count").unwrap().returns(5usize);
    let inner = repo.instance();
    repo.arrangements()
        .method("find")
        .unwrap()
        .when(move |_| inner.count() == 5)
        .returns(Some("nested".to_string()));

    let instance = repo.instance();
    let (sender, receiver) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = sender.send(instance.find(1));
    });
    let found = receiver
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("predicate re-entering the dependency must not block");
    assert_eq!(found, Some("nested".to_string()));
    assert_eq!(repo.journal().count(), 2);
}

// ============================================================================
// Async members
// ============================================================================

#[test]
fn test_async_value_resolves_arranged_value() {
    let repo = mock(Behavior::Permissive);
    repo.arrangements()
        .method("load")
        .unwrap()
        .returns(Some("cached".to_string()));

    assert_eq!(block_on(repo.instance().load(1)), Some("cached".to_string()));
}

#[test]
fn test_async_completion_and_stream() {
    let repo = mock(Behavior::Strict);
    repo.arrangements().method("flush").unwrap().completes();
    repo.arrangements()
        .method("names")
        .unwrap()
        .streams(vec!["ada".to_string(), "bob".to_string()]);

    block_on(repo.instance().flush());
    let names: Vec<String> = block_on(repo.instance().names().collect());
    assert_eq!(names, vec!["ada", "bob"]);
}

// ============================================================================
// Strict
// ============================================================================

#[test]
#[should_panic(expected = "IRepo::find")]
fn test_strict_miss_names_contract_and_member() {
    let repo = mock(Behavior::Strict);
    repo.instance().find(1);
}

#[test]
#[should_panic(expected = "property getter 'IRepo::limit'")]
fn test_strict_miss_classifies_getter() {
    let repo = mock(Behavior::Strict);
    repo.instance().limit();
}

#[test]
fn test_strict_arranged_call_succeeds() {
    let repo = mock(Behavior::Strict);
    repo.arrangements().method("save").unwrap().does_nothing();
    repo.instance().save("ada");
    assert_eq!(repo.journal().count(), 1);
}

// ============================================================================
// PassThrough
// ============================================================================

#[test]
fn test_pass_through_forwards_misses_only() {
    let (repo, calls) = decorated(Behavior::PassThrough);
    repo.arrangements()
        .method("find")
        .unwrap()
        .with_arg("id", 2u32)
        .returns(Some("mock".to_string()));

    assert_eq!(repo.instance().find(1), Some("real-1".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(repo.instance().find(2), Some("mock".to_string()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pass_through_forwards_parameters() {
    let (repo, _) = decorated(Behavior::PassThrough);

    let mut parsed = 0;
    assert!(repo.instance().try_parse("12", &mut parsed));
    assert_eq!(parsed, 12);

    let mut counter = 4;
    repo.instance().bump(&mut counter);
    assert_eq!(counter, 5);

    assert_eq!(repo.instance().limit(), 10);
    assert_eq!(block_on(repo.instance().load(3)), Some("loaded-3".to_string()));
}

#[test]
fn test_permissive_decorator_never_forwards() {
    let (repo, calls) = decorated(Behavior::Permissive);
    assert_eq!(repo.instance().find(1), None);
    repo.instance().save("ada");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Journal
// ============================================================================

#[test]
fn test_journal_counts_calls_per_member() {
    let repo = mock(Behavior::Permissive);
    repo.instance().find(1);
    repo.instance().find(2);
    repo.instance().count();

    let find = repo
        .arrangements()
        .descriptor()
        .method_signature("find")
        .unwrap();
    let journal = repo.journal();
    assert!(journal.assert_received(&find, 2).is_ok());

    let err = journal.assert_received(&find, 3).unwrap_err();
    assert!(err.to_string().contains("Expected 3 calls to IRepo::find, but found 2"));
}

#[test]
fn test_disabled_journal_records_nothing() {
    let options = MockOptions::default().with_record_calls(false);
    let repo = MockFactory::with_options(options)
        .create::<dyn Repo>(Behavior::Permissive)
        .unwrap();
    repo.instance().find(1);
    assert_eq!(repo.journal().count(), 0);
}

// ============================================================================
// Borrowing arguments
// ============================================================================

#[test]
fn test_borrowing_arguments_are_recorded_by_type() {
    let search = MockFactory::new()
        .create::<dyn Search>(Behavior::Permissive)
        .unwrap();
    search
        .arrangements()
        .method("find")
        .unwrap()
        .when(|call| {
            let filter = call.input_parameters().unwrap().by_name("filter").unwrap();
            !filter.is_set() && filter.declared().name().contains("Option<&str>")
        })
        .with_arg("limit", 4usize)
        .returns(2usize);

    let text = String::from("ada");
    assert_eq!(search.instance().find(Some(&text), 4), 2);
    assert_eq!(search.instance().find(None, 9), 0);

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    search.instance().each(&move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(seen.load(Ordering::SeqCst), 0);
    assert_eq!(search.journal().count(), 3);
}

#[test]
fn test_pass_through_forwards_borrowing_arguments() {
    let search = MockFactory::new()
        .decorate::<dyn Search>(Arc::new(RealSearch), Behavior::PassThrough)
        .unwrap();
    let text = String::from("grace");
    assert_eq!(search.instance().find(Some(&text), 3), 3);

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    search.instance().each(&move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(seen.load(Ordering::SeqCst), 3);
}

proptest! {
    #[test]
    fn prop_permissive_find_is_none(id in any::<u32>()) {
        let repo = mock(Behavior::Permissive);
        prop_assert_eq!(repo.instance().find(id), None);
    }

    #[test]
    fn prop_arranged_count_round_trips(value in any::<usize>()) {
        let repo = mock(Behavior::Strict);
        repo.arrangements().method("count").unwrap().returns(value);
        prop_assert_eq!(repo.instance().count(), value);
    }
}
