use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matrix_engine::{
    calculate_matrix, AttrValue, Band, BandConfig, GroupToggles, GroupingIndex, GroupingSpec,
    MatrixDefinition, RecordSet, SortDirection, SortState,
};
use std::time::Duration;

fn create_records(size: usize) -> RecordSet {
    let tissues = ["Skin", "Liver", "Brain", "Lung", "Colon", ""];
    let assays = ["WGS", "RNA-seq", "ATAC-seq", "Fiber-seq", "Hi-C"];

    let mut records = RecordSet::new();
    for i in 0..size {
        records.add_record(vec![
            ("donor", AttrValue::from(format!("SMHT{:03}", i % 40))),
            ("tissue", AttrValue::from(tissues[i % tissues.len()])),
            ("assay", AttrValue::from(assays[(i / 7) % assays.len()])),
            ("size", AttrValue::from((i % 1000) as f64)),
        ]);
    }
    records
}

fn create_definition() -> MatrixDefinition {
    let mut def = MatrixDefinition::new(GroupingSpec::new(vec!["donor", "tissue"], "assay"));
    def.row_bands = Some(BandConfig::new(vec![
        Band::new("Donors", (0..20).map(|i| format!("SMHT{:03}", i)).collect::<Vec<String>>()),
        Band::new("Benchmark", (20..30).map(|i| format!("SMHT{:03}", i)).collect::<Vec<String>>()),
    ]));
    def.open_depths = vec![0];
    def
}

fn benchmark_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping_index");
    let def = create_definition();

    for size in [1_000, 10_000, 100_000].iter() {
        let records = create_records(*size);
        group.bench_with_input(BenchmarkId::new("build", size), &records, |b, records| {
            b.iter(|| black_box(GroupingIndex::build(records, &def.grouping)));
        });
    }

    group.finish();
}

fn benchmark_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_layout");
    group.measurement_time(Duration::from_secs(10));
    let def = create_definition();
    let toggles = GroupToggles::new(&def.open_depths, Duration::ZERO);

    for size in [1_000, 10_000, 100_000].iter() {
        let records = create_records(*size);
        let index = GroupingIndex::build(&records, &def.grouping);

        group.bench_with_input(BenchmarkId::new("unordered", size), &index, |b, index| {
            b.iter(|| black_box(calculate_matrix(&def, &records, index, &SortState::unordered(), &toggles)));
        });

        let sort = SortState::by("WGS", SortDirection::Descending);
        group.bench_with_input(BenchmarkId::new("count_sorted", size), &index, |b, index| {
            b.iter(|| black_box(calculate_matrix(&def, &records, index, &sort, &toggles)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_grouping, benchmark_layout);
criterion_main!(benches);
