// crates/canopen-drive/tests/library_test.rs
//
// Lifecycle of the channel-slot facade: initialise/deinitialise, slot
// allocation and stable handles.

mod simulator;

use canopen_drive::{
    BaudRate, CanOpenDriver, ChannelConfig, ChannelManager, DriveError, DriverFactory,
};
use simulator::{FakeCanOpen, FakeTransportState};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Hands out simulated transports and keeps hold of their shared states so
/// the tests can inspect each opened channel.
struct FakeFactory {
    states: Rc<RefCell<Vec<Rc<RefCell<FakeTransportState>>>>>,
    fail_open: Rc<Cell<bool>>,
}

impl FakeFactory {
    #[allow(clippy::type_complexity)]
    fn new() -> (
        Self,
        Rc<RefCell<Vec<Rc<RefCell<FakeTransportState>>>>>,
        Rc<Cell<bool>>,
    ) {
        let states = Rc::new(RefCell::new(Vec::new()));
        let fail_open = Rc::new(Cell::new(false));
        (
            Self {
                states: Rc::clone(&states),
                fail_open: Rc::clone(&fail_open),
            },
            states,
            fail_open,
        )
    }
}

impl DriverFactory for FakeFactory {
    fn create(&self) -> Box<dyn CanOpenDriver> {
        let (driver, state) = FakeCanOpen::new();
        state.borrow_mut().fail_open = self.fail_open.get();
        self.states.borrow_mut().push(state);
        Box::new(driver)
    }
}

fn config(device: &str) -> ChannelConfig {
    ChannelConfig::new("libfake_can.so", device, BaudRate::Baud500K)
}

fn started_manager() -> (ChannelManager, Rc<RefCell<Vec<Rc<RefCell<FakeTransportState>>>>>) {
    let (factory, states, _) = FakeFactory::new();
    let mut manager = ChannelManager::new();
    assert!(manager.initialise(Box::new(factory)));
    (manager, states)
}

#[test]
fn open_before_initialise_is_refused() {
    let mut manager = ChannelManager::new();
    assert_eq!(
        manager.open_channel(config("/dev/can0"), None),
        Err(DriveError::NotInitialised)
    );
}

#[test]
fn initialise_is_idempotent() {
    let (mut manager, _states) = started_manager();
    let (second_factory, _, _) = FakeFactory::new();
    assert!(manager.initialise(Box::new(second_factory)));
    assert!(manager.open_channel(config("/dev/can0"), None).is_ok());
}

#[test]
fn slots_fill_first_free_and_exhaust() {
    let (mut manager, states) = started_manager();

    let first = manager.open_channel(config("/dev/can0"), None).unwrap();
    let second = manager.open_channel(config("/dev/can1"), None).unwrap();
    assert_eq!(first.slot(), 0);
    assert_eq!(second.slot(), 1);
    assert_eq!(
        manager.open_channel(config("/dev/can2"), None),
        Err(DriveError::SlotExhausted)
    );

    let states = states.borrow();
    assert_eq!(
        states[0].borrow().opened.as_ref().unwrap().1,
        "/dev/can0".to_string()
    );
    assert_eq!(
        states[1].borrow().opened.as_ref().unwrap().1,
        "/dev/can1".to_string()
    );
}

#[test]
fn a_requested_slot_is_honoured_when_free() {
    let (mut manager, _states) = started_manager();

    let handle = manager.open_channel(config("/dev/can0"), Some(1)).unwrap();
    assert_eq!(handle.slot(), 1);
    assert_eq!(manager.channel(handle).unwrap().channel_idx(), 1);

    assert_eq!(
        manager.open_channel(config("/dev/can1"), Some(1)),
        Err(DriveError::SlotExhausted)
    );
    assert_eq!(
        manager.open_channel(config("/dev/can1"), Some(9)),
        Err(DriveError::SlotOutOfRange(9))
    );
}

#[test]
fn closing_a_channel_frees_its_slot_and_shuts_the_transport() {
    let (mut manager, states) = started_manager();

    let handle = manager.open_channel(config("/dev/can0"), None).unwrap();
    manager.close_channel(handle);
    assert!(manager.channel(handle).is_none());
    assert!(states.borrow()[0].borrow().closed);

    // The slot is reusable and old handles stay harmless.
    let reopened = manager.open_channel(config("/dev/can1"), None).unwrap();
    assert_eq!(reopened.slot(), 0);
    manager.close_channel(handle);
}

#[test]
fn a_failed_transport_open_leaves_the_slot_free() {
    let (factory, states, fail_open) = FakeFactory::new();
    let mut manager = ChannelManager::new();
    manager.initialise(Box::new(factory));

    fail_open.set(true);
    assert_eq!(
        manager.open_channel(config("/dev/can0"), None),
        Err(DriveError::TransportOpenFailed)
    );
    assert_eq!(states.borrow().len(), 1, "one transport was attempted");

    // Once the driver behaves, the same slot opens fine.
    fail_open.set(false);
    let handle = manager.open_channel(config("/dev/can0"), None).unwrap();
    assert_eq!(handle.slot(), 0);
}

#[test]
fn deinitialise_closes_everything_and_forgets_the_factory() {
    let (mut manager, states) = started_manager();
    let first = manager.open_channel(config("/dev/can0"), None).unwrap();
    let second = manager.open_channel(config("/dev/can1"), None).unwrap();

    manager.deinitialise();
    assert!(manager.channel(first).is_none());
    assert!(manager.channel(second).is_none());
    for state in states.borrow().iter() {
        assert!(state.borrow().closed);
    }
    assert_eq!(
        manager.open_channel(config("/dev/can0"), None),
        Err(DriveError::NotInitialised)
    );
}

#[test]
fn handles_address_their_own_channel() {
    let (mut manager, _states) = started_manager();
    let first = manager.open_channel(config("/dev/can0"), None).unwrap();
    let second = manager.open_channel(config("/dev/can1"), None).unwrap();

    manager.channel_mut(first).unwrap().update();
    manager.channel_mut(first).unwrap().update();
    manager.channel_mut(second).unwrap().update();

    assert_eq!(manager.channel(first).unwrap().frame_idx(), 2);
    assert_eq!(manager.channel(second).unwrap().frame_idx(), 1);
}
