use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use stockroom_core::{PartId, UserId};
use stockroom_infra::{
    seed_demo_data, AuditRecorder, InMemoryStore, InventoryStore, StockMutationCoordinator,
};
use stockroom_inventory::{ledger_balance, MovementType, RecordMovement};
use tokio::runtime::Runtime;

const CONTROLLER: UserId = UserId::new(2);
const BOLTS: PartId = PartId::new(8);

fn setup(rt: &Runtime) -> (Arc<InMemoryStore>, StockMutationCoordinator) {
    let store = Arc::new(InMemoryStore::new());
    rt.block_on(seed_demo_data(store.as_ref(), store.as_ref(), 4))
        .unwrap();
    let audit = AuditRecorder::new(store.clone());
    let coordinator = StockMutationCoordinator::new(store.clone(), audit);
    (store, coordinator)
}

fn receipt(quantity: i64) -> RecordMovement {
    RecordMovement {
        part_id: BOLTS,
        movement_type: MovementType::In,
        quantity,
        reference: "PO-BENCH".to_string(),
        note: String::new(),
    }
}

fn bench_record_movement_latency(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("record_movement_latency");

    group.bench_function("receipt", |b| {
        let (_, coordinator) = setup(&rt);
        b.iter(|| {
            rt.block_on(coordinator.record_movement(receipt(black_box(1)), CONTROLLER))
                .unwrap();
        });
    });

    // Alternating receipt/issue keeps the bin level flat.
    group.bench_function("receipt_then_issue", |b| {
        let (_, coordinator) = setup(&rt);
        b.iter(|| {
            rt.block_on(async {
                coordinator
                    .record_movement(receipt(black_box(10)), CONTROLLER)
                    .await
                    .unwrap();
                let mut issue = receipt(black_box(10));
                issue.movement_type = MovementType::Out;
                coordinator.record_movement(issue, CONTROLLER).await.unwrap();
            });
        });
    });

    group.finish();
}

fn bench_ledger_balance(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("ledger_balance");

    for history in [10usize, 100, 1000] {
        group.throughput(Throughput::Elements(history as u64));
        group.bench_with_input(BenchmarkId::new("fold", history), &history, |b, &size| {
            let (store, coordinator) = setup(&rt);
            for _ in 0..size {
                rt.block_on(coordinator.record_movement(receipt(1), CONTROLLER))
                    .unwrap();
            }
            let ledger = rt.block_on(store.list_movements(None)).unwrap();
            b.iter(|| black_box(ledger_balance(&ledger, BOLTS)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record_movement_latency, bench_ledger_balance);
criterion_main!(benches);
