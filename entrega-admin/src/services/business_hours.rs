//! Opening hours per weekday

use super::AdminContext;
use crate::sequencer::{Direction, MoveOutcome};
use crate::store::{Query, Table, field, to_record};
use chrono::NaiveTime;
use shared::models::{BusinessHour, BusinessHourCreate, BusinessHourUpdate, day_name};
use shared::{AppError, AppResult, ErrorCode};
use tracing::{info, instrument};

const INVALID_TIME: &str = "Formato inválido. Use HH:MM (24h)";
const DAY_TAKEN: &str = "Já existe um registro para este dia da semana.";

#[derive(Clone)]
pub struct BusinessHoursService {
    ctx: AdminContext,
}

impl BusinessHoursService {
    pub fn new(ctx: AdminContext) -> Self {
        Self { ctx }
    }

    /// Days by display order, then weekday
    pub async fn list(&self) -> Vec<BusinessHour> {
        let result = self.ctx.fetch(&list_query()).await;
        self.ctx
            .settle(result, "Não foi possível carregar os horários de funcionamento.")
            .unwrap_or_default()
    }

    /// Add a weekday; each weekday has at most one row
    #[instrument(skip(self, input), fields(weekday = input.weekday))]
    pub async fn create(&self, input: BusinessHourCreate) -> Option<BusinessHour> {
        let result = self.try_create(input).await;
        let hour = self
            .ctx
            .settle(result, "Não foi possível salvar o horário de funcionamento.")?;
        self.ctx.success(
            "Horário criado",
            "O horário de funcionamento foi criado com sucesso.",
        );
        Some(hour)
    }

    async fn try_create(&self, input: BusinessHourCreate) -> AppResult<BusinessHour> {
        check_weekday(input.weekday)?;
        check_time(&input.open_time)?;
        check_time(&input.close_time)?;

        let taken = self
            .ctx
            .store
            .count(&Query::table(Table::OperatingHours).eq("weekday", input.weekday))
            .await?;
        if taken > 0 {
            return Err(AppError::with_message(ErrorCode::InvalidBusinessHours, DAY_TAKEN));
        }

        let hour = BusinessHour {
            id: shared::util::new_id(),
            weekday: input.weekday,
            open_time: input.open_time,
            close_time: input.close_time,
            is_open: input.is_open,
            display_order: input.display_order.unwrap_or(i32::from(input.weekday)),
        };
        self.ctx
            .store
            .insert(Table::OperatingHours, to_record(&hour)?)
            .await?;
        info!(id = %hour.id, day = hour.day_name(), "Business hour created");
        Ok(hour)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: BusinessHourUpdate) -> Option<BusinessHour> {
        let result = self.try_update(id, update).await;
        let hour = self
            .ctx
            .settle(result, "Não foi possível salvar o horário de funcionamento.")?;
        self.ctx.success(
            "Horário atualizado",
            "O horário de funcionamento foi atualizado com sucesso.",
        );
        Some(hour)
    }

    async fn try_update(&self, id: &str, update: BusinessHourUpdate) -> AppResult<BusinessHour> {
        if let Some(weekday) = update.weekday {
            check_weekday(weekday)?;
            let taken = self
                .ctx
                .store
                .count(
                    &Query::table(Table::OperatingHours)
                        .eq("weekday", weekday)
                        .neq("id", id),
                )
                .await?;
            if taken > 0 {
                return Err(AppError::with_message(ErrorCode::InvalidBusinessHours, DAY_TAKEN));
            }
        }
        for time in [&update.open_time, &update.close_time].into_iter().flatten() {
            check_time(time)?;
        }
        self.ctx
            .store
            .update(Table::OperatingHours, id, to_record(&update)?)
            .await?;
        self.ctx.get(Table::OperatingHours, id).await
    }

    /// Flip `is_open`; returns the new value
    #[instrument(skip(self, hour), fields(id = %hour.id))]
    pub async fn toggle_open(&self, hour: &BusinessHour) -> Option<bool> {
        let is_open = !hour.is_open;
        let result = self
            .ctx
            .store
            .update(Table::OperatingHours, &hour.id, field("is_open", is_open))
            .await
            .map_err(AppError::from);
        self.ctx
            .settle(result, "Não foi possível atualizar o status do dia.")?;

        let (title, state) = if is_open {
            ("Dia aberto", "marcado como aberto")
        } else {
            ("Dia fechado", "marcado como fechado")
        };
        self.ctx
            .success(title, format!("{} {state}.", hour.day_name()));
        Some(is_open)
    }

    pub async fn move_day(&self, list: &[BusinessHour], id: &str, direction: Direction) -> MoveOutcome {
        self.ctx
            .sequencer
            .move_item(Table::OperatingHours, list, id, direction)
            .await
    }

    /// Mark every day closed; returns how many rows were written
    pub(crate) async fn close_all(&self) -> AppResult<usize> {
        let hours: Vec<BusinessHour> = self.ctx.fetch(&list_query()).await?;
        let updates: Vec<_> = hours
            .iter()
            .filter(|h| h.is_open)
            .map(|h| (h.id.clone(), field("is_open", false)))
            .collect();
        let count = updates.len();
        self.ctx
            .store
            .update_many(Table::OperatingHours, updates)
            .await?;
        Ok(count)
    }
}

fn list_query() -> Query {
    Query::table(Table::OperatingHours)
        .order_asc("display_order")
        .order_asc("weekday")
}

fn check_weekday(weekday: u8) -> AppResult<()> {
    match day_name(weekday) {
        Some(_) => Ok(()),
        None => Err(AppError::with_message(
            ErrorCode::InvalidBusinessHours,
            "Dia da semana inválido.",
        )
        .with_detail("weekday", weekday)),
    }
}

/// `HH:MM`, 24h, two digits each
fn check_time(value: &str) -> AppResult<()> {
    let valid = value.len() == 5 && NaiveTime::parse_from_str(value, "%H:%M").is_ok();
    if valid {
        Ok(())
    } else {
        Err(AppError::with_message(ErrorCode::InvalidBusinessHours, INVALID_TIME)
            .with_detail("value", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service() -> (BusinessHoursService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = AdminContext::new(Arc::new(MemoryStore::new()), notifier.clone());
        (BusinessHoursService::new(ctx), notifier)
    }

    fn day(weekday: u8, is_open: bool) -> BusinessHourCreate {
        BusinessHourCreate {
            weekday,
            open_time: "18:00".into(),
            close_time: "23:30".into(),
            is_open,
            display_order: None,
        }
    }

    #[test]
    fn test_check_time() {
        assert!(check_time("08:00").is_ok());
        assert!(check_time("23:59").is_ok());
        assert!(check_time("24:00").is_err());
        assert!(check_time("8:00").is_err());
        assert!(check_time("18:00:00").is_err());
    }

    #[tokio::test]
    async fn test_list_orders_by_display_order_then_weekday() {
        let (svc, _) = service();
        for weekday in [3, 1, 2] {
            let mut input = day(weekday, true);
            input.display_order = Some(0);
            svc.create(input).await.unwrap();
        }
        let weekdays: Vec<_> = svc.list().await.into_iter().map(|h| h.weekday).collect();
        assert_eq!(weekdays, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_weekday_rejected() {
        let (svc, notifier) = service();
        svc.create(day(5, true)).await.unwrap();
        assert!(svc.create(day(5, false)).await.is_none());
        assert_eq!(notifier.last().unwrap().description, DAY_TAKEN);
        assert_eq!(svc.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_onto_taken_weekday_rejected() {
        let (svc, notifier) = service();
        svc.create(day(1, true)).await.unwrap();
        let terca = svc.create(day(2, true)).await.unwrap();

        let onto_monday = BusinessHourUpdate {
            weekday: Some(1),
            ..Default::default()
        };
        assert!(svc.update(&terca.id, onto_monday).await.is_none());
        assert_eq!(notifier.last().unwrap().description, DAY_TAKEN);
        let weekdays: Vec<_> = svc.list().await.into_iter().map(|h| h.weekday).collect();
        assert_eq!(weekdays, [1, 2]);

        // keeping its own weekday is not a clash
        let same_day = BusinessHourUpdate {
            weekday: Some(2),
            close_time: Some("22:00".into()),
            ..Default::default()
        };
        let saved = svc.update(&terca.id, same_day).await.unwrap();
        assert_eq!(saved.weekday, 2);
        assert_eq!(saved.close_time, "22:00");
    }

    #[tokio::test]
    async fn test_toggle_open_message() {
        let (svc, notifier) = service();
        let sexta = svc.create(day(5, true)).await.unwrap();

        assert_eq!(svc.toggle_open(&sexta).await, Some(false));
        let last = notifier.last().unwrap();
        assert_eq!(last.title, "Dia fechado");
        assert_eq!(last.description, "Sexta-feira marcado como fechado.");
        assert!(!svc.list().await[0].is_open);
    }

    #[tokio::test]
    async fn test_move_day_swaps_display_order() {
        let (svc, _) = service();
        svc.create(day(0, false)).await.unwrap();
        let segunda = svc.create(day(1, true)).await.unwrap();

        let list = svc.list().await;
        assert!(svc.move_day(&list, &segunda.id, Direction::Up).await.is_swapped());
        let weekdays: Vec<_> = svc.list().await.into_iter().map(|h| h.weekday).collect();
        assert_eq!(weekdays, [1, 0]);
    }

    #[tokio::test]
    async fn test_close_all() {
        let (svc, _) = service();
        for weekday in 0..7 {
            svc.create(day(weekday, weekday % 2 == 0)).await.unwrap();
        }
        assert_eq!(svc.close_all().await.unwrap(), 4);
        assert!(svc.list().await.iter().all(|h| !h.is_open));
    }
}
