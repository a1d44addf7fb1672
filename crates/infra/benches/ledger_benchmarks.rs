use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use chrono::Utc;
use shopledger_accountbook::{AccountBookProjector, DateRange};
use shopledger_core::{DepositId, LocationId};
use shopledger_documents::{Deposit, DepositStore};
use shopledger_infra::{InMemoryAccountStore, InMemoryDocumentDb};
use shopledger_ledger::{Account, AccountStore};

/// Measures the account-book fold: rebuild one account's ledger from N
/// deposit rows.
fn bench_account_book_projection(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("build runtime");

    let mut group = c.benchmark_group("account_book_projection");
    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let db = Arc::new(InMemoryDocumentDb::new());
            let accounts = Arc::new(InMemoryAccountStore::new());
            let location = LocationId::new();
            let account = Account::open("Bench", "ACC-BENCH", 0, location);
            let account_id = account.id;

            runtime.block_on(async {
                accounts.insert(account).await.unwrap();
                for i in 0..size {
                    db.insert_deposit(Deposit {
                        id: DepositId::new(),
                        to_account: account_id,
                        amount: (i % 500) as i64 + 1,
                        note: None,
                        reference_no: format!("DEP2026/{i:04}"),
                        business_location: location,
                        date_time: Utc::now(),
                    })
                    .await
                    .unwrap();
                }
            });

            let projector = AccountBookProjector::new(Arc::clone(&db), Arc::clone(&accounts));
            b.iter(|| {
                let book = runtime
                    .block_on(projector.project(account_id, DateRange::default(), None))
                    .unwrap();
                black_box(book.closing_balance)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_account_book_projection);
criterion_main!(benches);
