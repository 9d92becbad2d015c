//! Performance benchmarks for the Timesheet Engine.
//!
//! This benchmark suite measures the reconciliation pipeline at the sizes a
//! weekly payroll run sees:
//! - Single employee-day
//! - Single employee week
//! - Week for 100 employees
//! - Week for 1000 employees
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, NaiveDate};
use timesheet_engine::calculation::{import_punches, process_day, process_week};
use timesheet_engine::config::ConfigLoader;
use timesheet_engine::models::{
    Employee, EmployeeDirectory, EmployeePunches, PayWeek, RawPunchRecord,
};

fn load_config() -> ConfigLoader {
    ConfigLoader::load("./config/default").expect("Failed to load config")
}

fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 12).expect("valid date")
}

fn record(clock_ref: &str, device: &str, date: NaiveDate, time: &str) -> RawPunchRecord {
    RawPunchRecord {
        person_ref: clock_ref.to_string(),
        device_label: device.to_string(),
        timestamp: format!("{} {}", date, time),
    }
}

/// Creates a week of scans for one badge: four main-clock scans Monday to
/// Thursday with one bathroom visit, and in/out on Friday.
fn create_week_records(clock_ref: &str) -> Vec<RawPunchRecord> {
    let mut records = Vec::new();
    for offset in 0..4 {
        let date = week_start() + Duration::days(offset);
        records.push(record(clock_ref, "Main Clock In", date, "07:31:00"));
        records.push(record(clock_ref, "Main Clock In", date, "07:32:10"));
        records.push(record(clock_ref, "Bathroom Entry", date, "10:02:00"));
        records.push(record(clock_ref, "Bathroom Exit", date, "10:09:00"));
        records.push(record(clock_ref, "Main Clock Out", date, "12:01:00"));
        records.push(record(clock_ref, "Main Clock In", date, "12:29:00"));
        records.push(record(clock_ref, "Main Clock Out", date, "16:31:00"));
    }
    let friday = week_start() + Duration::days(4);
    records.push(record(clock_ref, "Main Clock In", friday, "07:29:00"));
    records.push(record(clock_ref, "Main Clock Out", friday, "13:02:00"));
    records
}

/// Creates a directory and the imported week for `employee_count` employees.
fn create_batch(employee_count: usize) -> Vec<EmployeePunches> {
    let employees: Vec<Employee> = (0..employee_count)
        .map(|i| Employee {
            id: format!("emp_bench_{:04}", i),
            display_name: format!("Bench Employee {}", i),
            clock_ref: format!("{}", 5000 + i),
            standard_hourly_rate: "28.50".parse().expect("valid rate"),
        })
        .collect();
    let directory = EmployeeDirectory::new(employees).expect("unique employees");

    let records: Vec<RawPunchRecord> = (0..employee_count)
        .flat_map(|i| create_week_records(&format!("{}", 5000 + i)))
        .collect();

    import_punches(&records, &directory).streams
}

/// Benchmark: One employee-day through every stage.
fn bench_single_day(c: &mut Criterion) {
    let config = load_config();
    let batch = create_batch(1);
    let date = week_start();
    let punches: Vec<_> = batch[0]
        .punches
        .iter()
        .filter(|p| p.timestamp.date() == date)
        .cloned()
        .collect();

    c.bench_function("single_day", |b| {
        b.iter(|| {
            black_box(process_day(
                black_box(date),
                black_box(&punches),
                config.time_rules(),
                1,
            ))
        })
    });
}

/// Benchmark: One employee's week.
fn bench_single_week(c: &mut Criterion) {
    let config = load_config();
    let batch = create_batch(1);
    let week = PayWeek::starting(week_start());

    c.bench_function("single_week", |b| {
        b.iter(|| black_box(process_week(black_box(&batch), &week, config.time_rules())))
    });
}

/// Benchmark: Import and process a week for 100 employees.
fn bench_batch_100(c: &mut Criterion) {
    let config = load_config();
    let batch = create_batch(100);
    let week = PayWeek::starting(week_start());

    let mut group = c.benchmark_group("batch");
    group.throughput(Throughput::Elements(100));
    group.bench_function("batch_100", |b| {
        b.iter(|| black_box(process_week(black_box(&batch), &week, config.time_rules())))
    });
    group.finish();
}

/// Benchmark: Import and process a week for 1000 employees.
fn bench_batch_1000(c: &mut Criterion) {
    let config = load_config();
    let batch = create_batch(1000);
    let week = PayWeek::starting(week_start());

    let mut group = c.benchmark_group("batch_large");
    group.throughput(Throughput::Elements(1000));
    group.sample_size(10);
    group.bench_function("batch_1000", |b| {
        b.iter(|| black_box(process_week(black_box(&batch), &week, config.time_rules())))
    });
    group.finish();
}

/// Benchmark: Various employee counts to understand scaling behavior.
fn bench_scaling(c: &mut Criterion) {
    let config = load_config();
    let week = PayWeek::starting(week_start());

    let mut group = c.benchmark_group("scaling");

    for employee_count in [1, 10, 50, 250].iter() {
        let batch = create_batch(*employee_count);

        group.throughput(Throughput::Elements(*employee_count as u64));
        group.bench_with_input(
            BenchmarkId::new("employees", employee_count),
            employee_count,
            |b, _| b.iter(|| black_box(process_week(&batch, &week, config.time_rules()))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_day,
    bench_single_week,
    bench_batch_100,
    bench_batch_1000,
    bench_scaling,
);
criterion_main!(benches);
