//! Heap traffic of each storage policy, measured with a counting global
//! allocator. Counters are per thread so that tests running in parallel do
//! not see each other's allocations. The allocator can also be told to
//! refuse one exact layout, which drives the allocation-failure paths.

use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    rc::Rc,
};

use erased_vehicle::{AllocError, JoinedTable, LocalTable, Remote, Sbo, SharedTable, prelude::*};
use erased_vehicle_internals::RawValue;

struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static DEALLOCATIONS: Cell<usize> = const { Cell::new(0) };
    static REFUSED: Cell<Option<Layout>> = const { Cell::new(None) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    let _ = counter.try_with(|count| count.set(count.get() + 1));
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if REFUSED.try_with(Cell::get).ok().flatten() == Some(layout) {
            return std::ptr::null_mut();
        }
        bump(&ALLOCATIONS);
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        bump(&DEALLOCATIONS);
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Counts {
    allocations: usize,
    deallocations: usize,
}

fn counts() -> Counts {
    Counts {
        allocations: ALLOCATIONS.with(Cell::get),
        deallocations: DEALLOCATIONS.with(Cell::get),
    }
}

/// Makes every allocation of `layout` on this thread fail until dropped.
struct RefuseLayout;

impl RefuseLayout {
    fn new(layout: Layout) -> Self {
        REFUSED.with(|refused| refused.set(Some(layout)));
        Self
    }
}

impl Drop for RefuseLayout {
    fn drop(&mut self) {
        REFUSED.with(|refused| refused.set(None));
    }
}

/// Runs `f` once to settle one-time setup, then again while counting.
fn measure<R>(mut f: impl FnMut() -> R) -> (R, Counts) {
    drop(f());
    let before = counts();
    let result = f();
    let after = counts();
    (
        result,
        Counts {
            allocations: after.allocations - before.allocations,
            deallocations: after.deallocations - before.deallocations,
        },
    )
}

#[derive(Clone)]
struct Scooter(u64);

impl Accelerate for Scooter {
    fn accelerate(&mut self) {
        self.0 += 1;
    }
}

#[derive(Clone)]
struct FreightTrain([u64; 16]);

impl Accelerate for FreightTrain {
    fn accelerate(&mut self) {
        self.0[0] += 1;
    }
}

#[derive(Clone, Copy)]
struct Glider;

impl Accelerate for Glider {
    fn accelerate(&mut self) {}
}

#[test]
fn test_sbo_small_payload_never_allocates() {
    let (_, counts) = measure(|| {
        let mut scooter: SboVehicle<32> = Vehicle::new(Scooter(0));
        let mut copy = scooter.clone();
        scooter.accelerate();
        copy.accelerate();
    });

    assert_eq!(counts.allocations, 0);
    assert_eq!(counts.deallocations, 0);
}

#[test]
fn test_sbo_large_payload_allocates_once_per_instance() {
    let (train, created) = measure(|| SboVehicle::<32>::new(FreightTrain([0; 16])));
    assert_eq!(created.allocations, 1);
    assert_eq!(train.storage(), StorageLocation::Heap);

    let (copy, cloned) = measure(|| train.clone());
    assert_eq!(cloned.allocations, 1);
    assert_eq!(copy.storage(), StorageLocation::Heap);

    let before = counts();
    drop(copy);
    drop(train);
    assert_eq!(counts().deallocations - before.deallocations, 2);
}

#[test]
fn test_remote_allocates_once_per_instance() {
    let (_, counts) = measure(|| {
        let scooter: RemoteVehicle = Vehicle::new(Scooter(0));
        let _copy = scooter.clone();
    });
    assert_eq!(counts.allocations, 2);
    assert_eq!(counts.deallocations, 2);

    let (_, counts) = measure(|| {
        let scooter: Vehicle<Remote, JoinedTable> = Vehicle::new(Scooter(0));
        let _copy = scooter.clone();
    });
    assert_eq!(counts.allocations, 2);
    assert_eq!(counts.deallocations, 2);
}

#[test]
fn test_remote_zero_sized_payload_never_allocates() {
    let (_, counts) = measure(|| {
        let mut glider: RemoteVehicle = Vehicle::new(Glider);
        glider.accelerate();
        let _copy = glider.clone();
    });

    assert_eq!(counts.allocations, 0);
    assert_eq!(counts.deallocations, 0);
}

#[test]
fn test_local_never_allocates() {
    let (_, counts) = measure(|| {
        let mut train: LocalVehicle<128> = Vehicle::new(FreightTrain([0; 16]));
        train.accelerate();
        let _copy = train.clone();

        let scooter: Vehicle<Sbo<8>, LocalTable> = Vehicle::new(Scooter(0));
        let _scooter_copy = scooter.clone();
    });

    assert_eq!(counts.allocations, 0);
    assert_eq!(counts.deallocations, 0);
}

#[test]
fn test_boxed_allocates_once_per_instance() {
    let (_, counts) = measure(|| {
        let mut scooter = BoxedVehicle::new(Scooter(0));
        scooter.accelerate();
        let _copy = scooter.clone();
    });

    assert_eq!(counts.allocations, 2);
    assert_eq!(counts.deallocations, 2);
}

#[test]
fn test_failed_downcast_does_not_allocate() {
    let scooter: Vehicle = Vehicle::new(Scooter(3));
    let (found, counts) = measure(|| scooter.downcast_ref::<FreightTrain>().is_some());

    assert!(!found);
    assert_eq!(counts.allocations, 0);
}

/// Large, over-aligned payload whose layout no other allocation in these
/// tests shares.
#[derive(Clone)]
#[repr(C, align(16))]
struct Tanker {
    cargo: [u64; 24],
    drops: Rc<Cell<u32>>,
}

impl Tanker {
    fn new(drops: &Rc<Cell<u32>>) -> Self {
        Self {
            cargo: [0; 24],
            drops: drops.clone(),
        }
    }
}

impl Drop for Tanker {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

impl Accelerate for Tanker {
    fn accelerate(&mut self) {
        self.cargo[0] += 1;
    }
}

fn names_tanker(report: &rootcause::Report<AllocError>) -> bool {
    report.attachments().iter().any(|attachment| {
        attachment
            .downcast_inner::<String>()
            .is_some_and(|text| text.starts_with("Payload type: ") && text.ends_with("Tanker"))
    })
}

#[test]
fn test_try_new_reports_failed_allocation() {
    let drops = Rc::new(Cell::new(0));
    let _refuse = RefuseLayout::new(Layout::new::<Tanker>());

    let report = SboVehicle::<32>::try_new(Tanker::new(&drops)).unwrap_err();
    assert_eq!(*report.current_context(), AllocError::new(Layout::new::<Tanker>()));
    assert!(names_tanker(&report));
    assert_eq!(drops.get(), 1);

    let report = RemoteVehicle::try_new(Tanker::new(&drops)).unwrap_err();
    assert_eq!(report.current_context().layout(), Layout::new::<Tanker>());
    assert_eq!(drops.get(), 2);
}

#[test]
fn test_try_clone_reports_failed_allocation() {
    let drops = Rc::new(Cell::new(0));
    let mut tanker: SboVehicle<32> = Vehicle::new(Tanker::new(&drops));

    let refuse = RefuseLayout::new(Layout::new::<Tanker>());
    let report = tanker.try_clone().unwrap_err();
    drop(refuse);

    assert!(names_tanker(&report));
    assert_eq!(drops.get(), 0);

    tanker.accelerate();
    assert_eq!(tanker.downcast_ref::<Tanker>().unwrap().cargo[0], 1);
    assert_eq!(tanker.try_clone().unwrap().storage(), StorageLocation::Heap);
    assert_eq!(drops.get(), 1);

    drop(tanker);
    assert_eq!(drops.get(), 2);
}

#[test]
fn test_raw_value_failed_allocation() {
    let drops = Rc::new(Cell::new(0));
    let source = RawValue::<Remote, SharedTable>::try_new(Tanker::new(&drops)).unwrap();

    let _refuse = RefuseLayout::new(Layout::new::<Tanker>());
    let error = RawValue::<Sbo<64>, JoinedTable>::try_new(Tanker::new(&drops)).unwrap_err();
    assert_eq!(error.layout(), Layout::new::<Tanker>());
    assert_eq!(drops.get(), 1);

    let error = source.try_clone().unwrap_err();
    assert_eq!(error.layout(), Layout::new::<Tanker>());
    assert_eq!(drops.get(), 1);
    assert!(source.downcast_ref::<Tanker>().is_some());
}

#[test]
fn test_inline_storage_ignores_allocator_failure() {
    let drops = Rc::new(Cell::new(0));
    let _refuse = RefuseLayout::new(Layout::new::<Tanker>());

    let tanker = LocalVehicle::<256>::try_new(Tanker::new(&drops)).unwrap();
    let copy = tanker.try_clone().unwrap();

    assert_eq!(copy.storage(), StorageLocation::Inline);
    assert_eq!(drops.get(), 0);
}

#[cfg(feature = "tracing")]
#[test]
fn test_failed_allocation_is_logged() {
    use std::sync::{Arc, Mutex};

    let output = Arc::new(Mutex::new(Vec::<u8>::new()));
    let writer = output.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || SharedBuffer(writer.clone()))
        .finish();

    let drops = Rc::new(Cell::new(0));
    tracing::subscriber::with_default(subscriber, || {
        let _refuse = RefuseLayout::new(Layout::new::<Tanker>());
        assert!(RemoteVehicle::try_new(Tanker::new(&drops)).is_err());
    });

    let output = String::from_utf8(output.lock().unwrap().clone()).unwrap();
    assert!(output.contains("DEBUG"));
    assert!(output.contains("failed to allocate vehicle storage"));
    assert!(output.contains("Tanker"));
    assert!(output.contains(&format!("size={}", Layout::new::<Tanker>().size())));
    assert!(output.contains("align=16"));
}

#[cfg(feature = "tracing")]
struct SharedBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(feature = "tracing")]
impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
