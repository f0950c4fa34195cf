//! End to end behaviour of nodes talking over TCP on localhost.
//!
//! Run with: cargo test --test ring

use std::net::TcpListener;
use std::sync::{Arc, Barrier};
use std::thread;

use chord::{messages::Request, CallError, Client, Config, Id, Session, SessionError};

fn session() -> Session {
    Session::new(Config {
        address: "127.0.0.1:0".to_string(),
        ..Default::default()
    })
}

#[test]
fn create_put_get_join() {
    let mut a = session();
    a.create().unwrap();
    let a_address = a.address().to_string();

    a.put(&a_address, "x", "1").unwrap();
    assert_eq!(a.get(&a_address, "x").unwrap(), Some("1".to_string()));

    let mut b = session();
    b.join(&a_address).unwrap();

    let a_info = a.dump().unwrap();
    assert_eq!(a_info.predecessor(), Some(b.address()));
    assert_eq!(a_info.id(), &Id::from_address(&a_address));
    // Joining leaves the store and the successor list untouched.
    assert_eq!(a_info.data(), &[("x".to_string(), "1".to_string())]);
    assert!(a_info.successors().iter().all(|s| s == &a_address));

    let b_info = b.dump().unwrap();
    assert_eq!(b_info.id(), &Id::from_address(b.address()));
    assert!(b_info.successors().iter().all(|s| s == &a_address));

    // Storage is local, b does not see what a stores.
    assert_eq!(b.get(b.address(), "x").unwrap(), None);
    // But any serving node can call a directly.
    assert_eq!(b.get(&a_address, "x").unwrap(), Some("1".to_string()));
}

#[test]
fn dump_a_peer_remotely() {
    let mut a = session();
    a.create().unwrap();

    let client = Client::default();
    client.put(a.address(), "k", "v").unwrap();

    let info = client.dump(a.address()).unwrap();
    assert_eq!(info, a.dump().unwrap());
}

#[test]
fn join_without_an_address_leaves_predecessor_unknown() {
    let mut a = session();
    a.create().unwrap();

    let client = Client::default();
    client.join(a.address(), "").unwrap();

    let local = a.dump().unwrap();
    let remote = client.dump(a.address()).unwrap();

    assert_eq!(local.predecessor(), None);
    assert_eq!(remote, local);
}

#[test]
fn unreachable_peer_is_a_call_error() {
    let mut a = session();
    a.create().unwrap();

    let dead = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .to_string();

    assert!(matches!(
        a.ping(&dead),
        Err(SessionError::Call(CallError::IO(_)))
    ));
    assert!(matches!(
        a.get(&dead, "x"),
        Err(SessionError::Call(CallError::IO(_)))
    ));
}

#[test]
fn keys_and_values_are_arbitrary_strings() {
    let mut a = session();
    a.create().unwrap();
    let address = a.address().to_string();

    for (key, value) in [("ключ", "значение"), ("e:5", "d1:xe"), ("k", "")] {
        a.put(&address, key, value).unwrap();
        assert_eq!(a.get(&address, key).unwrap(), Some(value.to_string()));
    }
}

#[test]
fn concurrent_clients_on_one_node() {
    let mut a = session();
    a.create().unwrap();
    let address = a.address().to_string();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let address = address.clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                let client = Client::default();
                barrier.wait();

                for i in 0..20 {
                    client.put(&address, "shared", &format!("{t}-{i}")).unwrap();
                    client.put(&address, &format!("own-{t}"), &i.to_string()).unwrap();
                    assert!(client.get(&address, "shared").unwrap().is_some());
                }

                client.delete(&address, &format!("own-{t}")).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let info = a.dump().unwrap();

    // Every own key was deleted, only one whole write to "shared" survives.
    assert_eq!(info.data().len(), 1);
    let (key, value) = &info.data()[0];
    assert_eq!(key, "shared");

    let (t, i) = value.split_once('-').unwrap();
    assert!(t.parse::<usize>().unwrap() < threads);
    assert!(i.parse::<usize>().unwrap() < 20);
}

#[test]
fn raw_call_primitive() {
    let mut a = session();
    a.create().unwrap();

    let response = chord::call(
        a.address(),
        Request::Get {
            key: "missing".to_string(),
        },
        chord::rpc::DEFAULT_REQUEST_TIMEOUT,
    )
    .unwrap();

    assert_eq!(response, chord::messages::Response::Get(None));
}
