use crate::config::GlobalConfig;
use crate::error::Result;
use crate::job::document::{ConfigDocument, Section};
use crate::job::request::{parse_job_tuple, Direction, JobRequest, Pattern, SubJobKey};

/// Jobs run when none are given on the command line.
pub const DEFAULT_JOBS: [&str; 4] = ["seq,8,1", "seq,1,1", "rnd,32,16", "rnd,1,1"];

/// Ordered job list plus the global settings it renders with.
#[derive(Debug, Clone)]
pub struct JobPlan {
    config: GlobalConfig,
    jobs: Vec<JobRequest>,
}

impl JobPlan {
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            config,
            jobs: Vec::new(),
        }
    }

    /// Builds a plan from `pattern,qd,threads[,bs]` tuples, or the default
    /// matrix when `specs` is empty.
    pub fn from_specs<S: AsRef<str>>(config: GlobalConfig, specs: &[S]) -> Result<Self> {
        let mut plan = Self::new(config);
        if specs.is_empty() {
            for spec in DEFAULT_JOBS {
                plan.push_spec(spec)?;
            }
        } else {
            for spec in specs {
                plan.push_spec(spec.as_ref())?;
            }
        }
        Ok(plan)
    }

    pub fn add_job(
        &mut self,
        pattern: &str,
        queue_depth: u32,
        thread_count: u32,
    ) -> Result<&JobRequest> {
        let pattern: Pattern = pattern.parse()?;
        let job = JobRequest::new(self.jobs.len(), pattern, queue_depth, thread_count, None)?;
        self.jobs.push(job);
        Ok(&self.jobs[self.jobs.len() - 1])
    }

    pub fn push_spec(&mut self, spec: &str) -> Result<&JobRequest> {
        let job = parse_job_tuple(self.jobs.len(), spec)?;
        self.jobs.push(job);
        Ok(&self.jobs[self.jobs.len() - 1])
    }

    pub fn jobs(&self) -> &[JobRequest] {
        &self.jobs
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn directions(&self) -> &'static [Direction] {
        if self.config.mix_read.is_some() {
            &[Direction::Read, Direction::Write, Direction::Mix]
        } else {
            &[Direction::Read, Direction::Write]
        }
    }

    /// Every sub-job in execution order.
    pub fn sub_jobs(&self) -> Vec<SubJobKey> {
        self.jobs
            .iter()
            .flat_map(|job| self.directions().iter().map(move |d| job.key(*d)))
            .collect()
    }

    pub fn render(&self) -> ConfigDocument {
        let mut sections = vec![self.global_section()];
        for key in self.sub_jobs() {
            sections.push(self.sub_job_section(&key));
        }
        ConfigDocument { sections }
    }

    fn global_section(&self) -> Section {
        let config = &self.config;
        let mut global = Section::new("global").set("ioengine", config.platform.ioengine);
        if config.platform.thread {
            global = global.flag("thread");
        }

        global = global
            .set("directory", config.directory.display())
            .set("filename", &config.filename)
            .set("size", config.size)
            .set("direct", 1)
            .set("runtime", config.runtime_secs)
            .set("ramp_time", config.ramp_time_secs)
            .set("invalidate", 1)
            .set("randrepeat", 0)
            .flag("norandommap");

        global = if config.zero_buffers {
            global.flag("zero_buffers")
        } else {
            global.flag("refill_buffers")
        };

        global.flag("group_reporting")
    }

    fn sub_job_section(&self, key: &SubJobKey) -> Section {
        let mut section = Section::new(key.to_string())
            .set("rw", key.direction.workload(key.pattern))
            .set("bs", key.block_size)
            .set("iodepth", key.queue_depth)
            .set("numjobs", key.thread_count)
            .set("loops", self.config.loops);

        if key.direction == Direction::Mix {
            if let Some(mix) = self.config.mix_read {
                section = section.set("rwmixread", mix);
            }
        }

        section.flag("stonewall")
    }
}
