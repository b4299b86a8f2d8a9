use crate::compiler::{CompiledScript, Compiler};
use crate::diagram::available_ports;
use crate::workspace::{load_workspace, save_workspace};
use pyo3::prelude::*;
use pyo3::types::PyDict;

impl<'py> IntoPyObject<'py> for CompiledScript {
    type Target = PyDict;
    type Output = Bound<'py, Self::Target>;
    type Error = PyErr;

    fn into_pyobject(self, py: Python<'py>) -> Result<Self::Output, Self::Error> {
        let dict = PyDict::new(py);
        let diagnostics: Vec<String> = self.diagnostics.iter().map(ToString::to_string).collect();
        dict.set_item("code", self.code)?;
        dict.set_item("diagnostics", diagnostics)?;
        Ok(dict)
    }
}

fn value_error(e: impl ToString) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
}

/// Compiles block-editor workspaces into lab automation scripts.
///
/// The block catalog is built once when the instance is created and reused
/// for every call.
#[pyclass(name = "BlockCompiler")]
struct BlockCompilerPy {
    compiler: Compiler,
}

#[pymethods]
impl BlockCompilerPy {
    #[new]
    fn new() -> Self {
        BlockCompilerPy {
            compiler: Compiler::standard(),
        }
    }

    /// Compiles a workspace.
    ///
    /// Args:
    ///     workspace_json (str): The workspace as saved by the block editor.
    ///     block_markers (bool): Prefix each block's code with a
    ///         ``# block_id: <id>`` line.
    ///
    /// Returns:
    ///     dict: ``code`` (str) and ``diagnostics`` (list[str]).
    ///
    /// Raises:
    ///     ValueError: If the JSON is malformed or references unknown block
    ///         kinds, sockets or fields.
    #[pyo3(signature = (workspace_json, block_markers = false))]
    fn compile(&self, workspace_json: &str, block_markers: bool) -> PyResult<CompiledScript> {
        let diagram = load_workspace(self.compiler.catalog(), workspace_json).map_err(value_error)?;
        let mut script = self.compiler.compile(&diagram);
        if block_markers {
            script.code = script.program.render_with_markers();
        }
        Ok(script)
    }

    /// Replaces the options of every serial-port dropdown and returns the
    /// updated workspace JSON. An empty list offers only ``COM3``.
    fn refresh_ports(&self, workspace_json: &str, ports: Vec<String>) -> PyResult<String> {
        let catalog = self.compiler.catalog();
        let mut diagram = load_workspace(catalog, workspace_json).map_err(value_error)?;
        diagram
            .refresh_ports(catalog, &available_ports(ports))
            .map_err(value_error)?;
        save_workspace(&diagram).map_err(value_error)
    }

    /// Lists the registered block kinds in registration order.
    fn block_kinds(&self) -> Vec<String> {
        self.compiler
            .catalog()
            .kinds()
            .map(|kind| kind.id().to_string())
            .collect()
    }
}

/// Python bindings for the LabBlocks compiler.
#[pymodule]
fn labblocks(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<BlockCompilerPy>()?;
    Ok(())
}
