//! Property-based tests for the connection hub
//!
//! Random sequences of register, unregister, dispatch and broadcast are
//! applied to a real hub and to a simple model. Afterwards the registry must
//! be consistent, agree with the model on who is connected, and every
//! session must have received exactly the frames the model predicts.

use proptest::prelude::*;
use std::collections::HashSet;

use chathub::backend::realtime::hub::{new_session, SessionMailbox};
use chathub::backend::realtime::Hub;
use chathub::shared::{PresenceStatus, RealtimeEvent};

const USERS: i64 = 4;

#[derive(Debug, Clone)]
enum Op {
    Register(i64),
    Unregister(usize),
    Dispatch(Vec<i64>),
    Broadcast,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..=USERS).prop_map(Op::Register),
        2 => (0usize..16).prop_map(Op::Unregister),
        2 => prop::collection::vec(1..=USERS + 1, 0..6).prop_map(Op::Dispatch),
        1 => Just(Op::Broadcast),
    ]
}

struct ModelSession {
    user_id: i64,
    live: bool,
    expected_frames: usize,
    mailbox: SessionMailbox,
}

fn deliver_to_live(model: &mut [ModelSession]) {
    for session in model.iter_mut().filter(|s| s.live) {
        session.expected_frames += 1;
    }
}

fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime");

    runtime.block_on(async move {
        let hub = Hub::spawn(None);
        let mut model: Vec<ModelSession> = Vec::new();

        for op in ops {
            match op {
                Op::Register(user_id) => {
                    let (entry, mailbox) = new_session(user_id, 1024);
                    hub.register(entry);
                    model.push(ModelSession {
                        user_id,
                        live: true,
                        expected_frames: 0,
                        mailbox,
                    });
                    deliver_to_live(&mut model);
                }
                Op::Unregister(index) => {
                    if model.is_empty() {
                        continue;
                    }
                    let index = index % model.len();
                    hub.unregister(model[index].mailbox.id);
                    if model[index].live {
                        model[index].live = false;
                        deliver_to_live(&mut model);
                    }
                }
                Op::Dispatch(targets) => {
                    let wanted: HashSet<i64> = targets.iter().copied().collect();
                    hub.dispatch(RealtimeEvent::typing(1, 0), targets);
                    for session in model.iter_mut().filter(|s| s.live) {
                        if wanted.contains(&session.user_id) {
                            session.expected_frames += 1;
                        }
                    }
                }
                Op::Broadcast => {
                    hub.broadcast(RealtimeEvent::presence(0, PresenceStatus::Online));
                    deliver_to_live(&mut model);
                }
            }
        }

        let snapshot = hub.snapshot().await.expect("hub is running");
        prop_assert!(snapshot.is_consistent());

        let live: HashSet<_> = model.iter().filter(|s| s.live).map(|s| s.mailbox.id).collect();
        let registered: HashSet<_> = snapshot.sessions.keys().copied().collect();
        prop_assert_eq!(&live, &registered);

        let live_users: HashSet<i64> = model.iter().filter(|s| s.live).map(|s| s.user_id).collect();
        prop_assert_eq!(snapshot.connected_users(), live_users.len());

        for session in model.iter_mut() {
            prop_assert_eq!(session.mailbox.is_closed(), !session.live);

            let mut received = 0;
            while session.mailbox.outbound.try_recv().is_ok() {
                received += 1;
            }
            prop_assert_eq!(received, session.expected_frames);
        }
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_hub_matches_model(ops in prop::collection::vec(op_strategy(), 0..30)) {
        run_ops(ops)?;
    }
}
