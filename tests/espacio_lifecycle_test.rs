use anyhow::Result;
use chrono::{Duration, Utc};
use hospital_espacios::core::{
    DepartamentoRepository, EspacioRepository, ServiciosMedicosEspaciosRepository,
};
use hospital_espacios::{
    Departamento, EspacioError, EspacioService, EspacioUpdate, Estatus, MemoryStore,
    NuevoEspacio, SnapshotFile, TipoEspacio,
};
use tempfile::TempDir;

/// Builds Edificio -> Piso -> Habitación -> Cama under a department.
async fn hospital(service: &EspacioService<MemoryStore>) -> Result<()> {
    service
        .repository()
        .insert_departamento(Departamento::new("pediatria", "Pediatría")?)
        .await?;
    service
        .crear(NuevoEspacio::new("Edificio", "Edificio A").with_id("edif-a"))
        .await?;
    service
        .crear(
            NuevoEspacio::new("Piso", "Piso 2")
                .with_id("piso-2")
                .with_superior("edif-a")
                .with_departamento("pediatria"),
        )
        .await?;
    service
        .crear(
            NuevoEspacio::new("Habitación", "Habitación 204")
                .with_id("hab-204")
                .with_superior("piso-2")
                .with_departamento("pediatria")
                .with_capacidad(2),
        )
        .await?;
    service
        .crear(
            NuevoEspacio::new("Cama", "Cama 204-A")
                .with_id("cama-204a")
                .with_superior("hab-204"),
        )
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_deleting_department_keeps_spaces() -> Result<()> {
    let service = EspacioService::new(MemoryStore::new());
    hospital(&service).await?;

    service.repository().delete_departamento("pediatria").await?;

    let espacios = service.listar().await?;
    assert_eq!(espacios.len(), 4);
    assert!(espacios.iter().all(|e| e.departamento_id.is_none()));
    Ok(())
}

#[tokio::test]
async fn test_deleting_parent_detaches_children() -> Result<()> {
    let service = EspacioService::new(MemoryStore::new());
    hospital(&service).await?;
    let link = service
        .repository()
        .link("servicio-radiologia", "hab-204")
        .await?;
    assert_eq!(service.repository().servicios_de("hab-204").await?, vec![link]);

    service.eliminar("hab-204").await?;

    let cama = service.obtener("cama-204a").await?;
    assert_eq!(cama.espacio_superior_id, None);
    assert!(service.ruta("cama-204a").await?.is_empty());
    assert!(service.repository().servicios_de("hab-204").await?.is_empty());
    assert!(matches!(
        service.obtener("hab-204").await,
        Err(EspacioError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_moving_space_under_descendant_is_rejected() -> Result<()> {
    let service = EspacioService::new(MemoryStore::new());
    hospital(&service).await?;

    let err = service
        .actualizar(
            "piso-2",
            EspacioUpdate {
                espacio_superior_id: Some(Some("cama-204a".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EspacioError::HierarchyCycleError { .. }));

    let piso = service.obtener("piso-2").await?;
    assert_eq!(piso.espacio_superior_id.as_deref(), Some("edif-a"));
    assert_eq!(piso.fecha_actualizacion, None);
    Ok(())
}

#[tokio::test]
async fn test_update_with_unknown_department_is_rejected_by_storage() -> Result<()> {
    let service = EspacioService::new(MemoryStore::new());
    hospital(&service).await?;

    let err = service
        .actualizar(
            "cama-204a",
            EspacioUpdate {
                departamento_id: Some(Some("cardiologia".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EspacioError::ReferentialIntegrityError { ref field, ref value }
            if field == "departamento_id" && value == "cardiologia"
    ));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_supplied_id() -> Result<()> {
    let service = EspacioService::new(MemoryStore::new());
    service
        .crear(NuevoEspacio::new("Farmacia", "Farmacia central").with_id("farm"))
        .await?;
    let err = service
        .crear(NuevoEspacio::new("Ventanilla", "Ventanilla 1").with_id("farm"))
        .await
        .unwrap_err();
    assert!(matches!(err, EspacioError::UniqueConstraintError { .. }));
    assert_eq!(service.obtener("farm").await?.tipo, TipoEspacio::Farmacia);
    Ok(())
}

#[tokio::test]
async fn test_timestamps_through_updates() -> Result<()> {
    let service = EspacioService::new(MemoryStore::new());
    let registro = Utc::now();
    let espacio = service
        .crear_at(NuevoEspacio::new("Recepción", "Recepción principal"), registro)
        .await?;

    let mut previous = espacio.fecha_actualizacion;
    for (minutes, estatus) in [(1, Estatus::Inactivo), (2, Estatus::Activo), (3, Estatus::Inactivo)] {
        let actualizado = service
            .actualizar_at(
                &espacio.id,
                EspacioUpdate {
                    estatus: Some(estatus.to_string()),
                    ..Default::default()
                },
                registro + Duration::minutes(minutes),
            )
            .await?;
        let fecha = actualizado.fecha_actualizacion.expect("set on update");
        assert!(fecha >= registro);
        assert!(Some(fecha) >= previous);
        assert_eq!(actualizado.fecha_registro, registro);
        previous = Some(fecha);
    }
    Ok(())
}

#[tokio::test]
async fn test_snapshot_persists_across_stores() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let snapshot = SnapshotFile::new(temp_dir.path().join("espacios.json"));

    let store = MemoryStore::from_tables(snapshot.load().await?);
    let service = EspacioService::new(store.clone());
    hospital(&service).await?;
    store.link("servicio-neonatal", "cama-204a").await?;
    snapshot.save(&store.snapshot().await).await?;

    let reopened = MemoryStore::from_tables(snapshot.load().await?);
    assert_eq!(reopened.snapshot().await, store.snapshot().await);
    assert_eq!(reopened.list().await?.len(), 4);
    assert_eq!(reopened.servicios_de("cama-204a").await?.len(), 1);

    let raw = tokio::fs::read_to_string(snapshot.path()).await?;
    assert!(raw.contains("\"tipo\": \"Habitación\""));
    assert!(raw.contains("tbc_espacios"));
    Ok(())
}
