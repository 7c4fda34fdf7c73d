use crate::domain::model::{Departamento, Espacio, ServicioMedicoEspacio};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Persistence of `tbc_espacios`. Implementations enforce the storage
/// constraints: unique id, existing foreign keys and an acyclic hierarchy.
#[async_trait]
pub trait EspacioRepository: Send + Sync {
    async fn insert(&self, espacio: Espacio) -> Result<Espacio>;
    async fn update(&self, espacio: Espacio) -> Result<Espacio>;
    /// Removes the row. Child spaces and service links keep existing with
    /// their reference set to null.
    async fn delete(&self, id: &str) -> Result<Espacio>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Espacio>>;
    async fn list(&self) -> Result<Vec<Espacio>>;
}

#[async_trait]
pub trait DepartamentoRepository: Send + Sync {
    async fn insert_departamento(&self, departamento: Departamento) -> Result<Departamento>;
    /// Spaces of the department survive with `departamento_id` nulled.
    async fn delete_departamento(&self, id: &str) -> Result<Departamento>;
    async fn departamento_exists(&self, id: &str) -> Result<bool>;
    async fn list_departamentos(&self) -> Result<Vec<Departamento>>;
}

#[async_trait]
pub trait ServiciosMedicosEspaciosRepository: Send + Sync {
    async fn link(&self, servicio_medico_id: &str, espacio_id: &str)
        -> Result<ServicioMedicoEspacio>;
    async fn unlink(&self, id: &str) -> Result<ServicioMedicoEspacio>;
    async fn servicios_de(&self, espacio_id: &str) -> Result<Vec<ServicioMedicoEspacio>>;
}
