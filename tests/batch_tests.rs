//! Batch and parallel mapping over PSL input

use ferro_probemap::annotation::MockAnnotationStore;
use ferro_probemap::batch::{into_association_map, BatchConfig, BatchProcessor};
use ferro_probemap::psl::{to_hits, PslReader};
use ferro_probemap::{AlignmentHit, ProbeMapper, ProbeMapperConfig};
use std::collections::HashMap;
use std::io::Cursor;

// probe1: exon of NM_TEST1; probe2: intergenic; probe3: below score
// threshold; probe4: two hits in NM_TEST2
const PSL: &str = "\
psLayout version 3

match\tmis-\trep.\tN's\tQ gap\tQ gap\tT gap\tT gap\tstrand\tQ\tQ\tQ\tQ\tT\tT\tT\tT\tblock\tblockSizes\tqStarts\ttStarts
---------------------------------------------------------------------------------------------------------------------------
100\t0\t0\t0\t0\t0\t0\t0\t+\tprobe1\t100\t0\t100\tchr1\t248956422\t1000\t1100\t1\t100,\t0,\t1000,
100\t0\t0\t0\t0\t0\t0\t0\t-\tprobe2\t100\t0\t100\tchr1\t248956422\t60000\t60100\t1\t100,\t0,\t60000,
40\t0\t0\t0\t0\t0\t0\t0\t+\tprobe3\t100\t0\t40\tchr1\t248956422\t1200\t1240\t1\t40,\t0,\t1200,
100\t0\t0\t0\t0\t0\t0\t0\t+\tprobe4\t100\t0\t100\tchr1\t248956422\t5000\t5100\t1\t100,\t0,\t5000,
100\t0\t0\t0\t0\t0\t0\t0\t+\tprobe4\t100\t0\t100\tchr1\t248956422\t5350\t5450\t1\t100,\t0,\t5350,
";

fn read_hits() -> Vec<AlignmentHit> {
    let records: Vec<_> = PslReader::new(Cursor::new(PSL))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 5);
    to_hits(&records, &HashMap::new())
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn mapper() -> ProbeMapper<MockAnnotationStore> {
    ProbeMapper::new(MockAnnotationStore::with_test_data(), ProbeMapperConfig::default()).unwrap()
}

#[test]
fn test_batch_over_psl() {
    let processor = BatchProcessor::new(mapper());
    let result = processor.map_hits(read_hits());

    assert_eq!(result.total(), 4);
    assert!(result.all_ok());
    assert_eq!(result.mapped_count(), 3);
    assert_eq!(result.unmapped_count(), 1);

    let map = into_association_map(result);
    assert_eq!(map["probe1"][0].gene_product.name, "NM_TEST1");
    assert_eq!(map["probe2"][0].gene_product.name, "probe2.par.1.60000.60100");
    assert!(!map.contains_key("probe3"));

    let probe4 = &map["probe4"];
    assert_eq!(probe4.len(), 1);
    assert_eq!(probe4[0].gene_product.name, "NM_TEST2");
    // On the minus strand the hit nearer the transcript start is the 3' one
    assert_eq!(probe4[0].hit.target_start, 5000);
}

#[test]
fn test_batch_progress_reports() {
    let processor = BatchProcessor::with_config(mapper(), BatchConfig::new().progress_interval(2));
    let mut seen = Vec::new();
    processor.map_hits_with_progress(read_hits(), |p| seen.push(p.processed));
    assert_eq!(seen, vec![2, 4]);
}

#[test]
fn test_batch_failures_are_isolated() {
    let mut store = MockAnnotationStore::with_test_data();
    store.fail_with("database offline");
    let mapper = ProbeMapper::new(store, ProbeMapperConfig::default()).unwrap();

    let processor = BatchProcessor::new(mapper);
    let result = processor.map_hits(read_hits());
    // probe3 never reaches the store
    assert_eq!(result.error_count(), 3);
    assert_eq!(result.success_count(), 1);
    assert_eq!(result.mapped_count(), 0);
}

#[test]
fn test_batch_stops_on_first_error() {
    let mut store = MockAnnotationStore::with_test_data();
    store.fail_with("database offline");
    let mapper = ProbeMapper::new(store, ProbeMapperConfig::default()).unwrap();

    let processor =
        BatchProcessor::with_config(mapper, BatchConfig::new().continue_on_error(false));
    let result = processor.map_hits(read_hits());
    assert_eq!(result.total(), 1);
    assert!(result.has_errors());
}

#[test]
fn test_batch_accessions() {
    let processor = BatchProcessor::new(mapper());
    let result = processor.map_accessions(&["BC000001", "NOPE"]);
    assert_eq!(result.total(), 2);
    assert_eq!(result.mapped_count(), 1);
    assert_eq!(result.unmapped_count(), 1);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_sequential() {
    use ferro_probemap::parallel::{map_hits_parallel, ParallelConfig, ParallelStats};

    let mapper = mapper();
    let sequential = mapper.process_hits_isolated(read_hits());
    let parallel = ParallelConfig::new()
        .with_num_threads(2)
        .install(|| map_hits_parallel(&mapper, read_hits()))
        .unwrap();

    assert_eq!(parallel.unmapped, sequential.unmapped);
    assert_eq!(parallel.associations.len(), sequential.associations.len());
    for (name, assocs) in &sequential.associations {
        let names: Vec<_> = assocs.iter().map(|a| a.gene_product.name.as_str()).collect();
        let other: Vec<_> = parallel.associations[name]
            .iter()
            .map(|a| a.gene_product.name.as_str())
            .collect();
        assert_eq!(names, other);
    }

    let stats = ParallelStats::from(&parallel);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.mapped, 3);
    assert_eq!(stats.unmapped, 1);
    assert_eq!(stats.errors, 0);
}
