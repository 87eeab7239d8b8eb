//! Provisioning pipeline and interactive session.
//!
//! A request is validated as a whole, built into a record, and appended to
//! the store. Invalid requests are reported and discarded; the session then
//! asks whether to provision another machine.
use crate::machine::{build_record, MachineRequest, MachineSpec};
use crate::store::MachineStore;
use crate::validate::{check_request, FieldRejection, SUPPORTED_OS};
use anyhow::Result;
use std::io::{BufRead, Write};

/// Result of submitting one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Accepted(MachineSpec),
    Rejected(Vec<FieldRejection>),
}

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The operator declined at the first prompt.
    Declined,
    Completed(ProvisionSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionSummary {
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
}

/// Validate and build a record without persisting it.
pub fn accept(request: &MachineRequest) -> Result<MachineSpec, Vec<FieldRejection>> {
    let fields = check_request(request)?;
    tracing::info!("'{}' VM specification is valid.", fields.name);
    Ok(build_record(fields.name, fields.os, fields.cpu, fields.ram))
}

/// Validate a request and append it to the store when accepted.
///
/// Rejections are data; only store failures are errors.
pub fn submit(store: &dyn MachineStore, request: &MachineRequest) -> Result<Submission> {
    match accept(request) {
        Ok(record) => {
            store.append(&record)?;
            tracing::info!(
                name = %record.name,
                store = %store.path().display(),
                "machine record persisted"
            );
            Ok(Submission::Accepted(record))
        }
        Err(rejections) => Ok(Submission::Rejected(rejections)),
    }
}

/// Prompt-driven provisioning over arbitrary input and output streams.
pub struct Session<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Run the prompt loop until the operator stops or input ends.
    pub fn run(&mut self, store: &dyn MachineStore) -> Result<ProvisionOutcome> {
        let answer = self.ask_yes_no(
            "\nWould you like to provision machines? (yes/no) ",
            "\nInvalid answer. Try again.\n",
        )?;
        if answer == Answer::No {
            writeln!(self.output, "\nOk. Exiting\n")?;
            tracing::info!("operator declined provisioning");
            return Ok(ProvisionOutcome::Declined);
        }

        let mut summary = ProvisionSummary::default();
        while let Some(request) = self.read_request()? {
            match submit(store, &request)? {
                Submission::Accepted(_) => summary.accepted += 1,
                Submission::Rejected(rejections) => {
                    summary.rejected += 1;
                    self.report_rejection(&request, &rejections)?;
                }
            }
            let another = self.ask_yes_no(
                "\nWould you like to provision another machine? (yes/no) ",
                "\nInvalid answer, try again",
            )?;
            if another == Answer::No {
                break;
            }
        }
        tracing::info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            "provisioning finished"
        );
        Ok(ProvisionOutcome::Completed(summary))
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// `None` when input ends before all four answers are given.
    fn read_request(&mut self) -> Result<Option<MachineRequest>> {
        let Some(name) = self.prompt("\nEnter a VM Name: ")? else {
            return Ok(None);
        };
        let os_prompt = format!(
            "Select the desired OS to be deployed to the VM: (Supported OS: {}) ",
            SUPPORTED_OS.join("/")
        );
        let Some(os) = self.prompt(&os_prompt)? else {
            return Ok(None);
        };
        let Some(cpu) = self.prompt("Insert the desired number of VM CPU cores (eg: 4): ")? else {
            return Ok(None);
        };
        let Some(ram) = self.prompt(
            "Insert the desired number of RAM to be allocated to the VM (size unit is in GB. eg: 16): ",
        )?
        else {
            return Ok(None);
        };
        Ok(Some(MachineRequest { name, os, cpu, ram }))
    }

    fn report_rejection(
        &mut self,
        request: &MachineRequest,
        rejections: &[FieldRejection],
    ) -> Result<()> {
        writeln!(
            self.output,
            "\nVM name '{}' validation test failed. The VM won't be provisioned",
            request.name
        )?;
        for rejection in rejections {
            writeln!(self.output, "  - {rejection}")?;
        }
        Ok(())
    }

    /// End of input counts as "no".
    fn ask_yes_no(&mut self, question: &str, invalid: &str) -> Result<Answer> {
        loop {
            let Some(answer) = self.prompt(question)? else {
                return Ok(Answer::No);
            };
            match answer.to_lowercase().as_str() {
                "yes" => return Ok(Answer::Yes),
                "no" => return Ok(Answer::No),
                _ => writeln!(self.output, "{invalid}")?,
            }
        }
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
