use crate::core::hierarchy::Jerarquia;
use crate::domain::model::{Espacio, EspacioUpdate, Estatus, NuevoEspacio};
use crate::domain::ports::EspacioRepository;
use crate::utils::error::{EspacioError, Result};
use chrono::{DateTime, Utc};

/// Applies the Espacio default-value and validation rules before handing
/// rows to a repository.
pub struct EspacioService<R: EspacioRepository> {
    repository: R,
}

impl<R: EspacioRepository> EspacioService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn crear(&self, nuevo: NuevoEspacio) -> Result<Espacio> {
        self.crear_at(nuevo, Utc::now()).await
    }

    pub async fn crear_at(&self, nuevo: NuevoEspacio, ahora: DateTime<Utc>) -> Result<Espacio> {
        let espacio = Espacio::create(nuevo, ahora).inspect_err(|e| {
            tracing::warn!("❌ Rejected new espacio: {}", e);
        })?;
        let espacio = self.repository.insert(espacio).await?;
        tracing::info!(
            "✅ Created espacio {} ({} '{}')",
            espacio.id,
            espacio.tipo,
            espacio.nombre
        );
        Ok(espacio)
    }

    pub async fn obtener(&self, id: &str) -> Result<Espacio> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| EspacioError::not_found("Espacio", id))
    }

    pub async fn listar(&self) -> Result<Vec<Espacio>> {
        self.repository.list().await
    }

    pub async fn actualizar(&self, id: &str, cambios: EspacioUpdate) -> Result<Espacio> {
        self.actualizar_at(id, cambios, Utc::now()).await
    }

    pub async fn actualizar_at(
        &self,
        id: &str,
        cambios: EspacioUpdate,
        ahora: DateTime<Utc>,
    ) -> Result<Espacio> {
        Ok(self.aplicar_cambios_at(id, cambios, ahora).await?.0)
    }

    pub async fn aplicar_cambios(
        &self,
        id: &str,
        cambios: EspacioUpdate,
    ) -> Result<(Espacio, bool)> {
        self.aplicar_cambios_at(id, cambios, Utc::now()).await
    }

    /// Writes only when some column actually changed; the flag says whether
    /// it did.
    pub async fn aplicar_cambios_at(
        &self,
        id: &str,
        cambios: EspacioUpdate,
        ahora: DateTime<Utc>,
    ) -> Result<(Espacio, bool)> {
        let mut espacio = self.obtener(id).await?;
        if !espacio.apply_update(cambios, ahora)? {
            tracing::debug!("Espacio {} unchanged, skipping write", id);
            return Ok((espacio, false));
        }
        let espacio = self.repository.update(espacio).await?;
        tracing::info!("✏️ Updated espacio {}", espacio.id);
        Ok((espacio, true))
    }

    pub async fn cambiar_estatus(&self, id: &str, estatus: Estatus) -> Result<Espacio> {
        self.actualizar(
            id,
            EspacioUpdate {
                estatus: Some(estatus.as_str().to_string()),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn eliminar(&self, id: &str) -> Result<Espacio> {
        let espacio = self.repository.delete(id).await?;
        tracing::info!("🗑️ Deleted espacio {} ('{}')", espacio.id, espacio.nombre);
        Ok(espacio)
    }

    /// Superior spaces of `id`, nearest first.
    pub async fn ruta(&self, id: &str) -> Result<Vec<Espacio>> {
        let espacios = self.repository.list().await?;
        let jerarquia = Jerarquia::new(&espacios);
        if jerarquia.get(id).is_none() {
            return Err(EspacioError::not_found("Espacio", id));
        }
        Ok(jerarquia.ancestors(id).into_iter().cloned().collect())
    }

    pub async fn arbol(&self) -> Result<String> {
        let espacios = self.repository.list().await?;
        Ok(Jerarquia::new(&espacios).render())
    }
}
