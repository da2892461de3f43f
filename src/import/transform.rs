use tracing::debug;

use super::node::ImportStateNode;
use super::target::{ImportTarget, ProviderSelection};
use crate::addrs::ResourceMode;
use crate::configs::Config;
use crate::core::errors::{ImportError, Result};
use crate::graph::{Graph, GraphTransformer};

/// Adds one import coordinator node per target.
///
/// Each node's provider selection is fixed here from the owning module's
/// configuration. No edges are added; provider attachment and the root node
/// come from later transformers.
pub struct ImportStateTransformer<'a> {
    targets: &'a [ImportTarget],
    config: Option<&'a Config>,
}

impl<'a> ImportStateTransformer<'a> {
    pub fn new(targets: &'a [ImportTarget], config: Option<&'a Config>) -> Self {
        Self { targets, config }
    }
}

impl GraphTransformer for ImportStateTransformer<'_> {
    fn transform(&self, graph: &mut Graph) -> Result<()> {
        for target in self.targets {
            let config = self
                .config
                .ok_or_else(|| ImportError::configuration("cannot import into an empty configuration"))?;

            let module_path = target.addr.module.module();
            let module_config = config.descendent(&module_path).ok_or_else(|| {
                ImportError::configuration(format!("module {} not found", module_path))
            })?;

            if target.addr.mode() == ResourceMode::Data {
                return Err(ImportError::configuration(format!(
                    "cannot import to {}: only managed resources can be imported",
                    target.addr
                )));
            }

            let selection = ProviderSelection::for_target(target, &module_config.module, &module_path);
            debug!("{} will use provider {}", target, selection.resolve());
            graph.add(ImportStateNode::new(target.addr.clone(), target.id.clone(), selection));
        }
        Ok(())
    }
}
