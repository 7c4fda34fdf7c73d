use crate::core::hierarchy::Jerarquia;
use crate::domain::model::{Departamento, Espacio, ServicioMedicoEspacio};
use crate::domain::ports::{
    DepartamentoRepository, EspacioRepository, ServiciosMedicosEspaciosRepository,
};
use crate::utils::error::{EspacioError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// All rows held by the store. This is also the snapshot file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub tbc_departamentos: BTreeMap<String, Departamento>,
    #[serde(default)]
    pub tbc_espacios: BTreeMap<String, Espacio>,
    #[serde(default)]
    pub tbd_servicios_medicos_espacios: BTreeMap<String, ServicioMedicoEspacio>,
}

impl Tables {
    /// Rows loaded from outside the store must still satisfy the column
    /// constraints, and every map key must be its row's id.
    pub fn check_integrity(&self) -> Result<()> {
        for (key, espacio) in &self.tbc_espacios {
            check_key("tbc_espacios", key, &espacio.id)?;
            espacio.validate()?;
        }
        for (key, departamento) in &self.tbc_departamentos {
            check_key("tbc_departamentos", key, &departamento.id)?;
            Departamento::new(departamento.id.clone(), departamento.nombre.clone())?;
        }
        for (key, link) in &self.tbd_servicios_medicos_espacios {
            check_key("tbd_servicios_medicos_espacios", key, &link.id)?;
        }
        Ok(())
    }

    fn check_references(&self, espacio: &Espacio) -> Result<()> {
        if let Some(superior) = espacio.espacio_superior_id.as_deref() {
            if Jerarquia::new(self.tbc_espacios.values()).would_create_cycle(&espacio.id, superior)
            {
                return Err(EspacioError::HierarchyCycleError {
                    espacio_id: espacio.id.clone(),
                    superior_id: superior.to_string(),
                });
            }
            if !self.tbc_espacios.contains_key(superior) {
                return Err(EspacioError::ReferentialIntegrityError {
                    field: "espacio_superior_id".to_string(),
                    value: superior.to_string(),
                });
            }
        }
        if let Some(departamento) = espacio.departamento_id.as_deref() {
            if !self.tbc_departamentos.contains_key(departamento) {
                return Err(EspacioError::ReferentialIntegrityError {
                    field: "departamento_id".to_string(),
                    value: departamento.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_key(table: &str, key: &str, id: &str) -> Result<()> {
    if key != id {
        return Err(EspacioError::validation(
            "id",
            id,
            format!("{} row is stored under key '{}'", table, key),
        ));
    }
    Ok(())
}

/// In-process storage engine. One lock guards every table so that
/// nullify-on-delete across tables happens as a single step.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    pub async fn snapshot(&self) -> Tables {
        self.tables.read().await.clone()
    }
}

#[async_trait]
impl EspacioRepository for MemoryStore {
    async fn insert(&self, espacio: Espacio) -> Result<Espacio> {
        let mut tables = self.tables.write().await;
        if tables.tbc_espacios.contains_key(&espacio.id) {
            return Err(EspacioError::UniqueConstraintError {
                id: espacio.id.clone(),
            });
        }
        tables.check_references(&espacio)?;
        tables
            .tbc_espacios
            .insert(espacio.id.clone(), espacio.clone());
        tracing::debug!(id = %espacio.id, tipo = %espacio.tipo, "espacio inserted");
        Ok(espacio)
    }

    async fn update(&self, espacio: Espacio) -> Result<Espacio> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.tbc_espacios.get(&espacio.id) else {
            return Err(EspacioError::not_found("Espacio", &espacio.id));
        };
        if current.fecha_registro != espacio.fecha_registro {
            return Err(EspacioError::validation(
                "fecha_registro",
                espacio.fecha_registro.to_rfc3339(),
                "fecha_registro cannot change after creation",
            ));
        }
        tables.check_references(&espacio)?;
        tables
            .tbc_espacios
            .insert(espacio.id.clone(), espacio.clone());
        tracing::debug!(id = %espacio.id, "espacio updated");
        Ok(espacio)
    }

    async fn delete(&self, id: &str) -> Result<Espacio> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .tbc_espacios
            .remove(id)
            .ok_or_else(|| EspacioError::not_found("Espacio", id))?;

        let mut orphaned = 0usize;
        for child in tables.tbc_espacios.values_mut() {
            if child.espacio_superior_id.as_deref() == Some(id) {
                child.espacio_superior_id = None;
                orphaned += 1;
            }
        }
        let mut unlinked = 0usize;
        for link in tables.tbd_servicios_medicos_espacios.values_mut() {
            if link.espacio_id.as_deref() == Some(id) {
                link.espacio_id = None;
                unlinked += 1;
            }
        }
        tracing::debug!(id, orphaned, unlinked, "espacio deleted");
        Ok(removed)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Espacio>> {
        Ok(self.tables.read().await.tbc_espacios.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Espacio>> {
        let tables = self.tables.read().await;
        let mut espacios: Vec<Espacio> = tables.tbc_espacios.values().cloned().collect();
        espacios.sort_by(|a, b| {
            a.fecha_registro
                .cmp(&b.fecha_registro)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(espacios)
    }
}

#[async_trait]
impl DepartamentoRepository for MemoryStore {
    async fn insert_departamento(&self, departamento: Departamento) -> Result<Departamento> {
        let mut tables = self.tables.write().await;
        if tables.tbc_departamentos.contains_key(&departamento.id) {
            return Err(EspacioError::UniqueConstraintError {
                id: departamento.id.clone(),
            });
        }
        tables
            .tbc_departamentos
            .insert(departamento.id.clone(), departamento.clone());
        Ok(departamento)
    }

    async fn delete_departamento(&self, id: &str) -> Result<Departamento> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .tbc_departamentos
            .remove(id)
            .ok_or_else(|| EspacioError::not_found("Departamento", id))?;
        for espacio in tables.tbc_espacios.values_mut() {
            if espacio.departamento_id.as_deref() == Some(id) {
                espacio.departamento_id = None;
            }
        }
        tracing::debug!(id, "departamento deleted");
        Ok(removed)
    }

    async fn departamento_exists(&self, id: &str) -> Result<bool> {
        Ok(self.tables.read().await.tbc_departamentos.contains_key(id))
    }

    async fn list_departamentos(&self) -> Result<Vec<Departamento>> {
        Ok(self
            .tables
            .read()
            .await
            .tbc_departamentos
            .values()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ServiciosMedicosEspaciosRepository for MemoryStore {
    async fn link(
        &self,
        servicio_medico_id: &str,
        espacio_id: &str,
    ) -> Result<ServicioMedicoEspacio> {
        let link = ServicioMedicoEspacio::new(servicio_medico_id, espacio_id, Utc::now())?;
        let mut tables = self.tables.write().await;
        if !tables.tbc_espacios.contains_key(espacio_id) {
            return Err(EspacioError::ReferentialIntegrityError {
                field: "espacio_id".to_string(),
                value: espacio_id.to_string(),
            });
        }
        tables
            .tbd_servicios_medicos_espacios
            .insert(link.id.clone(), link.clone());
        Ok(link)
    }

    async fn unlink(&self, id: &str) -> Result<ServicioMedicoEspacio> {
        self.tables
            .write()
            .await
            .tbd_servicios_medicos_espacios
            .remove(id)
            .ok_or_else(|| EspacioError::not_found("ServiciosMedicosEspacios", id))
    }

    async fn servicios_de(&self, espacio_id: &str) -> Result<Vec<ServicioMedicoEspacio>> {
        let tables = self.tables.read().await;
        let mut links: Vec<ServicioMedicoEspacio> = tables
            .tbd_servicios_medicos_espacios
            .values()
            .filter(|l| l.espacio_id.as_deref() == Some(espacio_id))
            .cloned()
            .collect();
        links.sort_by(|a, b| a.fecha_registro.cmp(&b.fecha_registro));
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::NuevoEspacio;

    fn espacio(id: &str, tipo: &str) -> Espacio {
        Espacio::create_now(NuevoEspacio::new(tipo, id).with_id(id)).unwrap()
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = MemoryStore::new();
        store.insert(espacio("a", "Oficina")).await.unwrap();
        let err = store.insert(espacio("a", "Oficina")).await.unwrap_err();
        assert!(matches!(err, EspacioError::UniqueConstraintError { ref id } if id == "a"));
    }

    #[tokio::test]
    async fn test_insert_checks_foreign_keys() {
        let store = MemoryStore::new();
        let huerfano = Espacio::create_now(
            NuevoEspacio::new("Cama", "Cama 1").with_superior("no-existe"),
        )
        .unwrap();
        let err = store.insert(huerfano).await.unwrap_err();
        assert!(matches!(
            err,
            EspacioError::ReferentialIntegrityError { ref field, .. } if field == "espacio_superior_id"
        ));

        let sin_depto =
            Espacio::create_now(NuevoEspacio::new("Oficina", "Of").with_departamento("dep-x"))
                .unwrap();
        let err = store.insert(sin_depto).await.unwrap_err();
        assert!(matches!(
            err,
            EspacioError::ReferentialIntegrityError { ref field, .. } if field == "departamento_id"
        ));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_reference_is_a_cycle() {
        let store = MemoryStore::new();
        let yo = Espacio::create_now(NuevoEspacio::new("Piso", "P").with_id("p").with_superior("p"))
            .unwrap();
        let err = store.insert(yo).await.unwrap_err();
        assert!(matches!(err, EspacioError::HierarchyCycleError { .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_cycle() {
        let store = MemoryStore::new();
        store.insert(espacio("edif", "Edificio")).await.unwrap();
        let piso = Espacio::create_now(NuevoEspacio::new("Piso", "Piso 1").with_id("piso").with_superior("edif"))
            .unwrap();
        store.insert(piso).await.unwrap();

        let mut edif = store.find_by_id("edif").await.unwrap().unwrap();
        edif.espacio_superior_id = Some("piso".into());
        let err = store.update(edif).await.unwrap_err();
        assert!(matches!(err, EspacioError::HierarchyCycleError { .. }));
        assert_eq!(
            store.find_by_id("edif").await.unwrap().unwrap().espacio_superior_id,
            None
        );
    }

    #[tokio::test]
    async fn test_update_missing_row() {
        let store = MemoryStore::new();
        let err = store.update(espacio("fantasma", "Capilla")).await.unwrap_err();
        assert!(matches!(err, EspacioError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_nullifies_children_and_links() {
        let store = MemoryStore::new();
        store.insert(espacio("hab", "Habitación")).await.unwrap();
        let cama = Espacio::create_now(NuevoEspacio::new("Cama", "Cama A").with_id("cama").with_superior("hab"))
            .unwrap();
        store.insert(cama).await.unwrap();
        let link = store.link("servicio-1", "hab").await.unwrap();

        store.delete("hab").await.unwrap();

        let cama = store.find_by_id("cama").await.unwrap().unwrap();
        assert_eq!(cama.espacio_superior_id, None);
        assert!(store.servicios_de("hab").await.unwrap().is_empty());
        let snapshot = store.snapshot().await;
        assert_eq!(
            snapshot.tbd_servicios_medicos_espacios[&link.id].espacio_id,
            None
        );
    }

    #[tokio::test]
    async fn test_delete_departamento_sets_null() {
        let store = MemoryStore::new();
        store
            .insert_departamento(Departamento::new("urg", "Urgencias").unwrap())
            .await
            .unwrap();
        let consultorio = Espacio::create_now(
            NuevoEspacio::new("Consultorio", "Consultorio 3B")
                .with_id("c3b")
                .with_departamento("urg"),
        )
        .unwrap();
        store.insert(consultorio).await.unwrap();

        store.delete_departamento("urg").await.unwrap();

        let consultorio = store.find_by_id("c3b").await.unwrap().unwrap();
        assert_eq!(consultorio.departamento_id, None);
        assert!(!store.departamento_exists("urg").await.unwrap());
    }

    #[tokio::test]
    async fn test_link_requires_existing_espacio() {
        let store = MemoryStore::new();
        let err = store.link("servicio-1", "nada").await.unwrap_err();
        assert!(matches!(err, EspacioError::ReferentialIntegrityError { .. }));
    }

    #[test]
    fn test_store_usable_from_sync_context() {
        let store = MemoryStore::new();
        tokio_test::block_on(async {
            store.insert(espacio("farm", "Farmacia")).await.unwrap();
            let servicios = store.servicios_de("farm").await.unwrap();
            assert!(servicios.is_empty());
            assert_eq!(store.list().await.unwrap().len(), 1);
        });
    }
}
