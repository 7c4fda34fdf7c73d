pub mod espacio_service;
pub mod hierarchy;

pub use crate::domain::model::{Espacio, EspacioUpdate, Estatus, NuevoEspacio, TipoEspacio};
pub use crate::domain::ports::{
    DepartamentoRepository, EspacioRepository, ServiciosMedicosEspaciosRepository,
};
pub use crate::utils::error::Result;
