use std::f64::consts::PI;

use serde::{Serialize, Deserialize};

use crate::optim::optimizer::Optimizer;

/// `training.scheduler` block: a named learning-rate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum SchedulerConfig {
    Constant,
    #[serde(rename = "StepLR")]
    Step { step_size: usize, gamma: f64 },
    /// `t_max` defaults to the configured number of epochs.
    #[serde(rename = "CosineAnnealingLR")]
    Cosine {
        #[serde(default)]
        t_max: Option<usize>,
        #[serde(default)]
        eta_min: f64,
    },
}

impl SchedulerConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulerConfig::Constant => "Constant",
            SchedulerConfig::Step { .. } => "StepLR",
            SchedulerConfig::Cosine { .. } => "CosineAnnealingLR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum Schedule {
    Constant,
    #[serde(rename = "StepLR")]
    Step { step_size: usize, gamma: f64 },
    #[serde(rename = "CosineAnnealingLR")]
    Cosine { t_max: usize, eta_min: f64 },
}

/// Epoch-level learning-rate scheduler. Stepped once after every epoch's
/// validation; `last_epoch` counts the steps taken so far and is what a
/// checkpoint restores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    pub schedule: Schedule,
    pub base_lr: f64,
    pub last_epoch: usize,
}

impl Scheduler {
    pub fn from_config(config: &SchedulerConfig, base_lr: f64, num_epochs: usize) -> Scheduler {
        let schedule = match *config {
            SchedulerConfig::Constant => Schedule::Constant,
            SchedulerConfig::Step { step_size, gamma } => Schedule::Step { step_size: step_size.max(1), gamma },
            SchedulerConfig::Cosine { t_max, eta_min } => Schedule::Cosine {
                t_max: t_max.unwrap_or(num_epochs).max(1),
                eta_min,
            },
        };
        Scheduler { schedule, base_lr, last_epoch: 0 }
    }

    pub fn kind(&self) -> &'static str {
        match self.schedule {
            Schedule::Constant => "Constant",
            Schedule::Step { .. } => "StepLR",
            Schedule::Cosine { .. } => "CosineAnnealingLR",
        }
    }

    /// Learning rate after `epoch` scheduler steps.
    pub fn learning_rate_at(&self, epoch: usize) -> f64 {
        match self.schedule {
            Schedule::Constant => self.base_lr,
            Schedule::Step { step_size, gamma } => self.base_lr * gamma.powi((epoch / step_size) as i32),
            Schedule::Cosine { t_max, eta_min } => {
                eta_min + (self.base_lr - eta_min) * (1.0 + (PI * epoch as f64 / t_max as f64).cos()) / 2.0
            }
        }
    }

    /// Advances one epoch and writes the new rate into `optimizer`.
    pub fn step(&mut self, optimizer: &mut Optimizer) {
        self.last_epoch += 1;
        optimizer.set_learning_rate(self.learning_rate_at(self.last_epoch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::Sgd;

    #[test]
    fn test_step_lr_decays_every_step_size() {
        let mut sched = Scheduler::from_config(&SchedulerConfig::Step { step_size: 2, gamma: 0.1 }, 1.0, 10);
        let mut opt = Optimizer::Sgd(Sgd::new(1.0));
        sched.step(&mut opt);
        assert_eq!(opt.learning_rate(), 1.0);
        sched.step(&mut opt);
        assert!((opt.learning_rate() - 0.1).abs() < 1e-12);
        assert_eq!(sched.last_epoch, 2);
    }

    #[test]
    fn test_cosine_reaches_eta_min_at_t_max() {
        let sched = Scheduler::from_config(&SchedulerConfig::Cosine { t_max: None, eta_min: 0.0 }, 0.1, 4);
        assert!((sched.learning_rate_at(0) - 0.1).abs() < 1e-12);
        assert!((sched.learning_rate_at(2) - 0.05).abs() < 1e-12);
        assert!(sched.learning_rate_at(4).abs() < 1e-12);
    }

    #[test]
    fn test_config_names() {
        let cfg: SchedulerConfig = serde_yaml::from_str("name: CosineAnnealingLR\n").unwrap();
        assert_eq!(cfg, SchedulerConfig::Cosine { t_max: None, eta_min: 0.0 });
        let cfg: SchedulerConfig = serde_yaml::from_str("name: StepLR\nstep_size: 30\ngamma: 0.1\n").unwrap();
        assert_eq!(cfg.kind(), "StepLR");
    }
}
