//! Integration tests for concurrent printing and masking.
//!
//! Printers only take non-blocking read locks, so they never wait on a masker
//! holding the write side; they print the cell as unavailable instead.

use std::{
    sync::{Arc, Mutex, RwLock, mpsc},
    thread,
    time::Duration,
};

use sanitize::{Asterisk, CYCLE_TAG, Sanitize, Token, UNAVAILABLE, mask, print, register_rule};

#[derive(Clone, Debug, Sanitize)]
struct Session {
    id: u32,
    #[mask(Token)]
    token: String,
    peer: Option<Arc<RwLock<Session>>>,
}

#[derive(Clone, Debug, Sanitize)]
struct Client {
    name: String,
    session: Arc<RwLock<Session>>,
}

const THREADS: usize = 8;
const ROUNDS: usize = 50;

fn looped_session() -> Arc<RwLock<Session>> {
    let session = Arc::new(RwLock::new(Session {
        id: 1,
        token: "tok_1234567890".into(),
        peer: None,
    }));
    session.write().unwrap().peer = Some(Arc::clone(&session));
    session
}

fn unlink(session: &Arc<RwLock<Session>>) {
    session.write().unwrap().peer = None;
}

#[test]
fn printers_and_maskers_share_a_cyclic_graph() {
    let session = looped_session();

    let outputs: Vec<String> = thread::scope(|scope| {
        let printers: Vec<_> = (0..THREADS)
            .map(|index| {
                let client = Client {
                    name: format!("client-{index}"),
                    session: Arc::clone(&session),
                };
                scope.spawn(move || {
                    (0..ROUNDS)
                        .map(|_| print(&client))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let maskers: Vec<_> = (0..THREADS / 2)
            .map(|_| {
                let mut client = Client {
                    name: "masker".into(),
                    session: Arc::clone(&session),
                };
                scope.spawn(move || {
                    for _ in 0..ROUNDS {
                        mask(&mut client).unwrap();
                    }
                })
            })
            .collect();

        for masker in maskers {
            masker.join().unwrap();
        }
        printers
            .into_iter()
            .flat_map(|printer| printer.join().unwrap())
            .collect()
    });

    assert_eq!(outputs.len(), THREADS * ROUNDS);
    for output in &outputs {
        assert!(output.starts_with("Client(name=client-"), "{output}");
        assert!(!output.contains("exceeds"), "{output}");
        if output.contains(UNAVAILABLE) {
            assert!(!output.contains("token="), "{output}");
        } else {
            assert_eq!(output.matches(CYCLE_TAG).count(), 1, "{output}");
            assert!(!output.contains("tok_1234567890"), "{output}");
        }
    }

    assert_eq!(session.read().unwrap().token, "**********7890");
    unlink(&session);
}

#[test]
fn printing_from_many_threads_is_consistent() {
    #[derive(Clone, Debug, Sanitize)]
    struct Shared {
        label: String,
        #[mask(Token)]
        secret: String,
    }

    register_rule::<Shared, Token>("label", &[]).unwrap();
    let shared = Arc::new(RwLock::new(Shared {
        label: "primary".into(),
        secret: "abcdefgh".into(),
    }));

    let outputs: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let shared = Arc::clone(&shared);
                scope.spawn(move || print(&shared))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for output in outputs {
        assert_eq!(output, "Shared(label=***mary, secret=****efgh)");
    }
}

#[derive(Clone, Debug, Sanitize)]
struct Link {
    #[mask(Asterisk)]
    secret: String,
    next: Option<Arc<Mutex<Link>>>,
}

#[test]
fn masking_a_cycle_from_both_ends_completes() {
    let first = Arc::new(Mutex::new(Link {
        secret: "alpha".into(),
        next: None,
    }));
    let second = Arc::new(Mutex::new(Link {
        secret: "beta".into(),
        next: Some(Arc::clone(&first)),
    }));
    first.lock().unwrap().next = Some(Arc::clone(&second));

    let (done, finished) = mpsc::channel();
    for entry in [&first, &second] {
        let mut entry = Arc::clone(entry);
        let done = done.clone();
        thread::spawn(move || {
            for _ in 0..ROUNDS * 100 {
                mask(&mut entry).unwrap();
            }
            done.send(()).unwrap();
        });
    }
    for _ in 0..2 {
        finished
            .recv_timeout(Duration::from_secs(30))
            .expect("masking threads should finish");
    }

    assert_eq!(first.lock().unwrap().secret, "******");
    assert_eq!(second.lock().unwrap().secret, "******");
    first.lock().unwrap().next = None;
}
