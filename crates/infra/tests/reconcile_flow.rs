//! End-to-end reconciliation flow: corrupt a warehouse, run the difference
//! report, queue the fix, let the worker drain it, verify convergence and the
//! notifications along the way.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use stockrecon_core::{LotId, ProductId, UserId};
use stockrecon_infra::{
    InMemoryJobStore, InMemoryNotifier, Job, JobExecutor, JobExecutorConfig, JobKind, JobStatus,
    JobStore, NotificationKind, ReconciliationService, ServiceError,
};
use stockrecon_ledger::{Location, LocationUsage, MoveLine, OnHandKey, ProductKind, ProductRecord};
use stockrecon_reconcile::{
    ClassificationPolicy, InMemoryStockStore, OnHandLedger, ReportStore, ToleranceFlag,
};

type Service =
    ReconciliationService<Arc<InMemoryStockStore>, Arc<InMemoryJobStore>, Arc<InMemoryNotifier>>;

struct Warehouse {
    store: Arc<InMemoryStockStore>,
    jobs: Arc<InMemoryJobStore>,
    notifier: Arc<InMemoryNotifier>,
    service: Service,
    suppliers: Location,
    customers: Location,
    shelf: Location,
    bin: Location,
}

fn warehouse() -> Result<Warehouse> {
    let store = InMemoryStockStore::arc();
    let jobs = InMemoryJobStore::arc();
    let notifier = InMemoryNotifier::arc();
    let service = ReconciliationService::new(
        Arc::clone(&store),
        Arc::clone(&jobs),
        Arc::clone(&notifier),
    );

    let suppliers = Location::new("Suppliers", LocationUsage::Supplier);
    let customers = Location::new("Customers", LocationUsage::Customer);
    let shelf = Location::new("WH/Shelf", LocationUsage::Internal);
    let bin = Location::new("WH/Bin", LocationUsage::Internal);
    for location in [&suppliers, &customers, &shelf, &bin] {
        store.add_location(location.clone())?;
    }

    Ok(Warehouse {
        store,
        jobs,
        notifier,
        service,
        suppliers,
        customers,
        shelf,
        bin,
    })
}

fn add_product(wh: &Warehouse, name: &str) -> Result<ProductId> {
    let product = ProductRecord::new(ProductId::new(), name, ProductKind::Stockable, 0.01)?;
    wh.store.add_product(product.clone())?;
    Ok(product.id)
}

fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}

#[test]
fn corrupted_warehouse_is_reported_queued_and_fixed() -> Result<()> {
    let wh = warehouse()?;
    let bolt = add_product(&wh, "Bolt M3")?;
    let washer = add_product(&wh, "Washer M3")?;
    let lot = LotId::new();

    // Bolt: 10 received, 4 moved shelf -> bin. The ledger implies 10 on hand.
    wh.store
        .record_line(MoveLine::done(bolt, wh.suppliers.id, wh.shelf.id, 10.0))?;
    wh.store
        .record_line(MoveLine::done(bolt, wh.shelf.id, wh.bin.id, 4.0))?;

    // Washer (lot-tracked): 6 received, 2 delivered. The ledger implies 4.
    wh.store.record_line(
        MoveLine::done(washer, wh.suppliers.id, wh.shelf.id, 6.0).with_lot(lot),
    )?;
    wh.store.record_line(
        MoveLine::done(washer, wh.shelf.id, wh.customers.id, 2.0).with_lot(lot),
    )?;

    // On-hand records: bolt is off by one, washer is correct.
    wh.store
        .set_on_hand(OnHandKey::new(bolt, wh.shelf.id, None), 9.0)?;
    wh.store
        .set_on_hand(OnHandKey::new(washer, wh.shelf.id, Some(lot)), 4.0)?;

    let report = wh
        .service
        .run_difference_report(ClassificationPolicy::ByLocationUsage)?;
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.flagged_count(), 1);
    assert_eq!(report.flagged_rows().next().map(|row| row.product), Some(bolt));

    let user = UserId::new();
    let job_id = wh.service.queue_rebalance(user)?;
    assert_eq!(wh.jobs.get(job_id)?.status, JobStatus::Pending);

    let service = Arc::new(wh.service);
    let mut executor = JobExecutor::new(
        Arc::clone(&wh.jobs),
        JobExecutorConfig {
            poll_interval: Duration::from_millis(10),
            name: "reconcile-test-worker".to_string(),
        },
    );
    executor.register_handler(JobKind::Rebalance.type_name(), service.rebalance_handler());
    let handle = executor.spawn();

    let finished = wait_until(Duration::from_secs(5), || {
        wh.jobs
            .get(job_id)
            .map(|job| job.is_terminal())
            .unwrap_or(false)
    });
    handle.shutdown();
    assert!(finished, "rebalance job did not finish in time");
    assert_eq!(wh.jobs.get(job_id)?.status, JobStatus::Completed);

    // The replay rebuilt bolt's per-location quantities from the ledger.
    assert_eq!(
        wh.store.on_hand(OnHandKey::new(bolt, wh.shelf.id, None))?,
        Some(6.0)
    );
    assert_eq!(
        wh.store.on_hand(OnHandKey::new(bolt, wh.bin.id, None))?,
        Some(4.0)
    );
    // Washer was never part of the fix.
    assert_eq!(
        wh.store
            .on_hand(OnHandKey::new(washer, wh.shelf.id, Some(lot)))?,
        Some(4.0)
    );

    // The verification pass saw everything line up.
    for row in wh.store.rows()? {
        assert_eq!(row.flag, ToleranceFlag::Within, "{} still flagged", row.name);
        assert_eq!(row.difference, 0.0);
    }

    // Queueing again finds nothing to fix.
    match service.queue_rebalance(user) {
        Err(ServiceError::NothingToFix) => {}
        other => panic!("expected NothingToFix, got {other:?}"),
    }

    // One info note at queue time, one sticky success at completion.
    let sent = wh.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].kind, NotificationKind::Info);
    assert_eq!(sent[0].recipient, user);
    assert!(!sent[0].sticky);
    assert_eq!(sent[1].kind, NotificationKind::Success);
    assert_eq!(sent[1].recipient, user);
    assert!(sent[1].sticky);

    Ok(())
}

#[test]
fn worker_reports_failures_back_to_the_user() -> Result<()> {
    let wh = warehouse()?;
    let user = UserId::new();

    // A rebalance job whose payload no handler can make sense of.
    let job = Job::new(
        user,
        JobKind::Rebalance,
        serde_json::json!({ "products": 42 }),
    );
    let job_id = job.id;
    wh.jobs.enqueue(job)?;

    let service = Arc::new(wh.service);
    let mut executor = JobExecutor::new(
        Arc::clone(&wh.jobs),
        JobExecutorConfig {
            poll_interval: Duration::from_millis(10),
            name: "reconcile-test-worker".to_string(),
        },
    );
    executor.register_handler(JobKind::Rebalance.type_name(), service.rebalance_handler());
    let handle = executor.spawn();

    let finished = wait_until(Duration::from_secs(5), || {
        wh.jobs
            .get(job_id)
            .map(|job| job.is_terminal())
            .unwrap_or(false)
    });
    handle.shutdown();
    assert!(finished, "job did not finish in time");

    match wh.jobs.get(job_id)?.status {
        JobStatus::Failed { error } => assert!(error.contains("invalid rebalance payload")),
        other => panic!("expected Failed, got {other:?}"),
    }

    let sent = wh.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::Error);
    assert_eq!(sent[0].recipient, user);
    assert!(sent[0].sticky);

    Ok(())
}
