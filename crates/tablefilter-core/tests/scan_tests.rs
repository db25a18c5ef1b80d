#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{LakeWriter, LocalLake, TestResult, p, sample_table};
use tablefilter_core::{ErrorKind, ScanConfig, list_visible_files};

#[tokio::test]
async fn recursive_scan_of_local_table() -> TestResult {
    let lake = LocalLake::new()?;
    sample_table(&lake)?;
    lake.data_files(&p("/d/p1/p2/p3/partB"), &["fileC_w1_0000000003.parquet"])?;
    lake.partition_marker(&p("/d/p1/p2/p3/partB"), 1)?;
    let filter = lake.filter();

    let config = ScanConfig {
        recursive: true,
        ..ScanConfig::default()
    };
    let report = list_visible_files(&filter, &p("/d/p1/p2/p3"), &config).await?;

    assert_eq!(
        report.accepted,
        vec![
            p("/d/p1/p2/p3/partA/fileA_w1_0000000002.parquet"),
            p("/d/p1/p2/p3/partA/fileB_w1_0000000001.parquet"),
        ]
    );
    assert_eq!(
        report.rejected,
        vec![
            p("/d/p1/p2/p3/partA/.partition_metadata"),
            p("/d/p1/p2/p3/partA/fileA_w1_0000000001.parquet"),
            p("/d/p1/p2/p3/partB/.partition_metadata"),
            p("/d/p1/p2/p3/partB/fileC_w1_0000000003.parquet"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn scan_of_plain_directory_accepts_everything() -> TestResult {
    let lake = LocalLake::new()?;
    lake.data_files(&p("/tmp"), &["b.csv", "a.csv"])?;
    let filter = lake.filter();

    let config = ScanConfig {
        concurrency: 1,
        recursive: false,
    };
    let report = list_visible_files(&filter, &p("/tmp"), &config).await?;
    assert_eq!(report.accepted, vec![p("/tmp/a.csv"), p("/tmp/b.csv")]);
    assert!(report.rejected.is_empty());
    Ok(())
}

#[tokio::test]
async fn scan_surfaces_metadata_errors() -> TestResult {
    let lake = LocalLake::new()?;
    let part = sample_table(&lake)?;
    lake.write(&part.child(".partition_metadata")?, "not json")?;
    let filter = lake.filter();

    let err = list_visible_files(&filter, &part, &ScanConfig::default())
        .await
        .expect_err("corrupt marker");
    assert_eq!(err.kind(), ErrorKind::MalformedMetadata);
    Ok(())
}
