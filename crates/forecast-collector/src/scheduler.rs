//! cron 기반 트리거.
//!
//! - 일일 업데이트: 지표 셀에 선택된 시장 실행 (기본 `0 0 0 * * *`)
//! - 지표 폴링: 값이 바뀌면 실행 (기본 `*/15 * * * * *`)
//!
//! cron 은 `schedule.timezone` 기준으로 해석됩니다 (기본 `Asia/Ho_Chi_Minh` 자정).
//!
//! 잡 내부 에러는 로그만 남기고 다음 주기를 기다립니다.

use chrono_tz::Tz;
use forecast_core::ScheduleConfig;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::dispatcher::Dispatcher;
use crate::summary::Trigger;

/// 트리거 스케줄러.
pub struct ForecastScheduler {
    scheduler: JobScheduler,
}

impl ForecastScheduler {
    /// 설정에 따라 잡을 등록하고 스케줄러를 시작합니다.
    ///
    /// # Errors
    /// cron 표현식이 잘못되었거나 스케줄러 시작에 실패하면 에러를 반환합니다.
    pub async fn start(
        dispatcher: Arc<Dispatcher>,
        settings: &ScheduleConfig,
        tz: Tz,
    ) -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;

        if settings.enable_daily {
            scheduler
                .add(daily_job(dispatcher.clone(), &settings.daily_cron, tz)?)
                .await?;
            info!(cron = %settings.daily_cron, %tz, "Daily update job registered");
        }

        if settings.enable_poll {
            scheduler.add(poll_job(dispatcher, &settings.poll_cron, tz)?).await?;
            info!(cron = %settings.poll_cron, "Indicator poll job registered");
        }

        scheduler.start().await?;
        info!("Scheduler started");

        Ok(Self { scheduler })
    }

    /// 스케줄러를 중지합니다.
    pub async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.scheduler.shutdown().await?;
        info!("Scheduler stopped");
        Ok(())
    }
}

fn daily_job(dispatcher: Arc<Dispatcher>, cron: &str, tz: Tz) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(cron, tz, move |_uuid, _lock| {
        let dispatcher = dispatcher.clone();
        Box::pin(async move {
            if let Err(e) = dispatcher.dispatch(Trigger::Daily).await {
                error!(stage = e.stage(), "Daily update failed: {}", e);
            }
        })
    })
}

fn poll_job(dispatcher: Arc<Dispatcher>, cron: &str, tz: Tz) -> Result<Job, JobSchedulerError> {
    Job::new_async_tz(cron, tz, move |_uuid, _lock| {
        let dispatcher = dispatcher.clone();
        Box::pin(async move {
            if let Err(e) = dispatcher.poll().await {
                error!(stage = e.stage(), "Indicator poll failed: {}", e);
            }
        })
    })
}
