use crate::frames::convert::topology_from_frame;
use crate::source::error::SourceError;
use crate::types::topology::Topology;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;

/// Loads a topology table from a CSV file.
///
/// Expected columns are `edge_name`, `from_node`, `to_node`, `operatorKey`,
/// `pointKey` and `directionKey`, an optional `edge_display_name`, and one
/// strategy column per indicator named by its short name (`flow`, `gcv`, ...).
pub async fn load_topology(path: &Path) -> Result<Topology, SourceError> {
    let path: PathBuf = path.to_path_buf();
    let topology = task::spawn_blocking(move || {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| SourceError::CsvRead {
                path: path.clone(),
                source: e,
            })?
            .finish()
            .map_err(|e| SourceError::CsvRead {
                path: path.clone(),
                source: e,
            })?;
        topology_from_frame(&df).map_err(|source| SourceError::Content { path, source })
    })
    .await??;
    info!(
        "Loaded topology with {} rows and {} edges",
        topology.rows().len(),
        topology.edge_names().len()
    );
    Ok(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::indicator::Indicator;
    use crate::types::strategy::StrategyCell;

    #[tokio::test]
    async fn test_load_topology() -> Result<(), SourceError> {
        let dir = tempfile::tempdir().map_err(|e| SourceError::DirCreation("tmp".into(), e))?;
        let path = dir.path().join("topology.csv");
        std::fs::write(
            &path,
            "edge_name,edge_display_name,from_node,to_node,operatorKey,pointKey,directionKey,flow,firm\n\
             DZ-IT,Transmed,DZ,IT,IT-TSO-0001,ITP-00104,entry,1,sum\n\
             DZ-IT,,DZ,IT,IT-TSO-0001,ITP-00105,entry,0,sum\n\
             ,,DE,NL,NL-TSO-0001,ITP-00200,exit,1,1\n",
        )
        .unwrap();

        let topology = load_topology(&path).await?;
        assert_eq!(topology.rows().len(), 2);
        assert_eq!(topology.edge_names(), vec!["DZ-IT"]);
        assert_eq!(topology.display_name("DZ-IT"), "Transmed");
        assert_eq!(
            topology.rows()[1].cell(Indicator::FirmTechnical),
            &StrategyCell::Sum
        );
        assert!(topology.rows()[1].cell(Indicator::PhysicalFlow).is_excluded());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.csv");
        std::fs::write(&path, "edge_name,from_node\nDZ-IT,DZ\n").unwrap();
        assert!(matches!(
            load_topology(&path).await,
            Err(SourceError::Content { .. })
        ));
    }
}
