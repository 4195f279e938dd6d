//! Persistence: one flat safetensors container of named tensors.
//!
//! Stored element widths `U8` and `I8` are both accepted and reinterpreted
//! into the signed arithmetic domain; anything else, a missing tensor or a
//! wrong shape rejects the whole file.

use std::fs;
use std::path::Path;

use ndarray::{Array2, Array4};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;

use crate::config::{NetConfig, BLOCK, EDGE, GRID, LINES, LINE_WIDTH};
use crate::error::{NetworkErr, Result};
use crate::net::Network;

fn tensor_data(st: &SafeTensors<'_>, name: &str, expected: &[usize]) -> Result<Vec<i8>> {
    let view = st.tensor(name).map_err(|_| NetworkErr::MissingTensor {
        name: name.to_string(),
    })?;
    match view.dtype() {
        Dtype::I8 | Dtype::U8 => {}
        other => {
            return Err(NetworkErr::UnsupportedDtype {
                name: name.to_string(),
                dtype: format!("{other:?}"),
            })
        }
    }
    if view.shape() != expected {
        return Err(NetworkErr::ShapeMismatch {
            name: name.to_string(),
            got: view.shape().to_vec(),
            expected: expected.to_vec(),
        });
    }
    Ok(view.data().iter().map(|&b| b as i8).collect())
}

fn tensor4(st: &SafeTensors<'_>, name: &str, shape: (usize, usize, usize, usize)) -> Result<Array4<i8>> {
    let data = tensor_data(st, name, &[shape.0, shape.1, shape.2, shape.3])?;
    Array4::from_shape_vec(shape, data).map_err(|_| NetworkErr::ShapeMismatch {
        name: name.to_string(),
        got: Vec::new(),
        expected: vec![shape.0, shape.1, shape.2, shape.3],
    })
}

fn tensor2(st: &SafeTensors<'_>, name: &str, shape: (usize, usize)) -> Result<Array2<i8>> {
    let data = tensor_data(st, name, &[shape.0, shape.1])?;
    Array2::from_shape_vec(shape, data).map_err(|_| NetworkErr::ShapeMismatch {
        name: name.to_string(),
        got: Vec::new(),
        expected: vec![shape.0, shape.1],
    })
}

impl Network {
    /// Serializes every tensor into one safetensors file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tensors = self.tensors();
        let mut entries = Vec::with_capacity(tensors.len());
        for (name, view) in &tensors {
            let data = view.to_slice().unwrap();
            let bytes: &[u8] = bytemuck::cast_slice(data);
            entries.push((
                name.clone(),
                TensorView::new(Dtype::I8, view.shape().to_vec(), bytes)?,
            ));
        }
        safetensors::serialize_to_file(entries, &None, path)?;
        Ok(())
    }

    /// Loads a network saved by [`Network::save`]. Fails loudly on a
    /// missing tensor, a shape mismatch or an unsupported element type.
    pub fn load(cfg: NetConfig, path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let st = SafeTensors::deserialize(&bytes)?;

        let layers = cfg.layer_count();
        let grid = (GRID, GRID, BLOCK, BLOCK);
        let mut left = Vec::with_capacity(layers);
        let mut right = Vec::with_capacity(layers);
        let mut bias = Vec::with_capacity(layers);
        for index in 0..layers {
            left.push(tensor4(&st, &format!("M-G{index}"), grid)?);
            right.push(tensor4(&st, &format!("M-D{index}"), grid)?);
            bias.push(tensor4(&st, &format!("B{index}"), grid)?);
        }

        Ok(Self {
            cfg,
            left,
            right,
            bias,
            scalar_gi: tensor4(&st, "R-Gi", (GRID, GRID, 1, BLOCK))?,
            scalar_di: tensor4(&st, "R-Di", (GRID, GRID, BLOCK, 1))?,
            scalar_ge: tensor4(&st, "R-Ge", (1, GRID, 1, 1))?,
            scalar_de: tensor4(&st, "R-De", (GRID, 1, 1, 1))?,
            reduce_g: tensor2(&st, "RM-G", (LINES, EDGE))?,
            reduce_d: tensor2(&st, "RM-D", (EDGE, LINE_WIDTH))?,
            corr_g: tensor4(&st, "R-G", grid)?,
            corr_d: tensor4(&st, "R-D", grid)?,
            snapshot: None,
        })
    }
}
