use super::host::{TimerKind, TrialHost};
use super::TrialError;
use gabor_cache::AssetSource;
use gabor_core::choices::normalize_key;
use gabor_core::{ProvidedConfig, StimulusConfig, TrialResult, TrialState, resolve};
use gabor_render::{PreparedStimulus, Scene};
use gabor_timing::{StopFlag, TimerHandle};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum TrialEvent {
    Timer(TimerHandle),
    Key { key: String, timestamp_ms: f64 },
    Refresh { timestamp_ms: f64 },
}

/// Mutable bookkeeping of one running trial.
#[derive(Debug, Clone, Default)]
pub struct TrialRuntimeState {
    pub participant_did_respond: bool,
    /// Milliseconds from onset to the first qualifying key press.
    pub reaction_time: Option<f64>,
    pub response: Option<String>,
    pub stimulus_timer: Option<TimerHandle>,
    pub trial_timer: Option<TimerHandle>,
    pub pacer: Option<StopFlag>,
    pub onset_ms: f64,
    pub listening: bool,
}

/// Drives one trial from presentation to the single `finish_trial` call.
pub struct TrialController<R: Rng> {
    prepared: PreparedStimulus,
    rng: R,
    state: TrialState,
    runtime: TrialRuntimeState,
    scene: Option<Scene>,
    result: Option<TrialResult>,
}

impl<R: Rng> TrialController<R> {
    pub fn new(prepared: PreparedStimulus, rng: R) -> Self {
        Self {
            prepared,
            rng,
            state: TrialState::Idle,
            runtime: TrialRuntimeState::default(),
            scene: None,
            result: None,
        }
    }

    /// Builds the scene off-surface, presents it in one step, arms the
    /// timers and starts listening. Errors leave the host untouched.
    pub fn start<H: TrialHost>(&mut self, host: &mut H) -> Result<(), TrialError> {
        if self.state != TrialState::Idle {
            return Err(TrialError::AlreadyStarted);
        }
        let scene = self.prepared.build_scene()?;
        let timing = self.prepared.config().timing.clone();
        let choices = self.prepared.config().choices.clone();

        host.present(scene.surface());
        self.runtime = TrialRuntimeState {
            onset_ms: host.now_ms(),
            pacer: scene.background_stop_flag(),
            ..Default::default()
        };
        self.scene = Some(scene);

        if timing.stimulus_duration_ms > 0 {
            self.runtime.stimulus_timer = Some(host.set_timeout(
                Duration::from_millis(timing.stimulus_duration_ms),
                TimerKind::StimulusHide,
            ));
        }
        if timing.trial_duration_ms > 0 {
            self.runtime.trial_timer = Some(host.set_timeout(
                Duration::from_millis(timing.trial_duration_ms),
                TimerKind::TrialEnd,
            ));
        }
        if !choices.is_empty() {
            host.listen_keys(&choices);
            self.runtime.listening = true;
        }

        self.state = TrialState::Presenting;
        info!(
            onset_ms = self.runtime.onset_ms,
            stimulus_duration_ms = timing.stimulus_duration_ms,
            trial_duration_ms = timing.trial_duration_ms,
            response_ends_trial = timing.response_ends_trial,
            "trial started"
        );
        Ok(())
    }

    /// Returns whether the event changed anything.
    pub fn handle_event<H: TrialHost>(
        &mut self,
        event: TrialEvent,
        host: &mut H,
        assets: &dyn AssetSource,
    ) -> bool {
        match event {
            TrialEvent::Timer(handle) => self.on_timer(handle, host),
            TrialEvent::Key { key, timestamp_ms } => self.on_key(&key, timestamp_ms, host),
            TrialEvent::Refresh { timestamp_ms } => self.on_refresh(timestamp_ms, host, assets),
        }
    }

    /// Stale handles (cleared or from another trial) are ignored.
    pub fn on_timer<H: TrialHost>(&mut self, handle: TimerHandle, host: &mut H) -> bool {
        if self.runtime.stimulus_timer == Some(handle) {
            self.runtime.stimulus_timer = None;
            self.hide_stimulus(host)
        } else if self.runtime.trial_timer == Some(handle) {
            self.runtime.trial_timer = None;
            self.end(host)
        } else {
            false
        }
    }

    /// First qualifying press wins; later presses change nothing.
    pub fn on_key<H: TrialHost>(&mut self, key: &str, timestamp_ms: f64, host: &mut H) -> bool {
        if !self.state.is_running()
            || !self.runtime.listening
            || self.runtime.participant_did_respond
            || !self.prepared.config().choices.accepts(key)
        {
            return false;
        }

        let rt = (timestamp_ms - self.runtime.onset_ms).max(0.0);
        let response = normalize_key(key);
        info!(rt_ms = rt, response = %response, "response recorded");
        self.runtime.participant_did_respond = true;
        self.runtime.reaction_time = Some(rt);
        self.runtime.response = Some(response);
        self.runtime.listening = false;
        host.stop_listening();

        if self.prepared.config().timing.response_ends_trial {
            self.end(host);
        }
        true
    }

    /// Advances a cycling background. Returns whether a new surface was
    /// presented.
    pub fn on_refresh<H: TrialHost>(
        &mut self,
        timestamp_ms: f64,
        host: &mut H,
        assets: &dyn AssetSource,
    ) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        if scene.on_refresh(timestamp_ms, assets, &mut self.rng) {
            host.present(scene.surface());
            return true;
        }
        false
    }

    /// Hides the stimulus and halts the background; timers and key capture
    /// keep running.
    fn hide_stimulus<H: TrialHost>(&mut self, host: &mut H) -> bool {
        if self.state != TrialState::Presenting {
            return false;
        }
        self.stop_pacer();
        if let Some(scene) = self.scene.as_mut() {
            scene.set_visible(false);
            host.present(scene.surface());
        }
        self.state = TrialState::StimulusHidden;
        debug!("stimulus hidden");
        true
    }

    /// Tears the trial down and reports the result. Safe to call any number
    /// of times; only the first call on a running trial does anything.
    pub fn end<H: TrialHost>(&mut self, host: &mut H) -> bool {
        if !self.state.is_running() {
            return false;
        }
        if let Some(handle) = self.runtime.stimulus_timer.take() {
            host.clear_timeout(handle);
        }
        if let Some(handle) = self.runtime.trial_timer.take() {
            host.clear_timeout(handle);
        }
        self.stop_pacer();
        if self.runtime.listening {
            self.runtime.listening = false;
            host.stop_listening();
        }
        self.scene = None;
        host.clear_display();

        let result = TrialResult {
            rt: self.runtime.reaction_time,
            response: self.runtime.response.clone(),
        };
        self.state = TrialState::Ended;
        self.result = Some(result.clone());
        info!(rt = ?result.rt, response = ?result.response, "trial ended");
        host.finish_trial(result);
        true
    }

    fn stop_pacer(&mut self) {
        if let Some(flag) = &self.runtime.pacer {
            flag.stop();
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.stop_background();
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn runtime(&self) -> &TrialRuntimeState {
        &self.runtime
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn config(&self) -> &StimulusConfig {
        self.prepared.config()
    }

    /// Set once the trial has ended.
    pub fn result(&self) -> Option<&TrialResult> {
        self.result.as_ref()
    }

    pub fn prepared(&self) -> &PreparedStimulus {
        &self.prepared
    }

    /// Hands the prepared stimulus back for the next trial.
    pub fn into_prepared(self) -> PreparedStimulus {
        self.prepared
    }
}

/// Resolves `provided`, prepares the stimulus and starts the trial. Every
/// error is returned before the host sees any call.
pub fn begin_trial<H, R>(
    provided: &ProvidedConfig,
    host: &mut H,
    mut rng: R,
) -> Result<TrialController<R>, TrialError>
where
    H: TrialHost,
    R: Rng,
{
    let config = resolve(provided)?;
    let prepared = PreparedStimulus::prepare(config, &mut rng)?;
    let mut controller = TrialController::new(prepared, rng);
    controller.start(host)?;
    Ok(controller)
}
