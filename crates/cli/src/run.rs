use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use topicsim_core::{
    generation_rng, mean_similarity, score_documents, GenerativeModel, SimConfig,
    TermDocumentMatrix, TopicInference,
};
use topicsim_store::{AnalysisRecord, RunParameters, SimStore};
use tracing::{error, info};

const TOP_WORDS_LOGGED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RecordParameters,
    Generate,
    PersistDocuments,
    FetchDocuments,
    BuildMatrix,
    Infer,
    Score,
    PersistResults,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::RecordParameters => "record parameters",
            Stage::Generate => "generate documents",
            Stage::PersistDocuments => "store documents",
            Stage::FetchDocuments => "fetch documents",
            Stage::BuildMatrix => "build term-document matrix",
            Stage::Infer => "fit topic model",
            Stage::Score => "score recovery",
            Stage::PersistResults => "store results",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StageStarted(Stage),
    StageFinished(Stage),
    RunRecorded { run_id: i64 },
    DocumentsGenerated { done: usize, total: usize },
    Completed(RunOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub run_id: i64,
    pub documents: usize,
    pub mean_similarity: f64,
}

struct Progress<'a>(&'a Sender<ProgressEvent>);

impl Progress<'_> {
    // A dropped receiver only means nobody is listening.
    fn emit(&self, event: ProgressEvent) {
        let _ = self.0.send(event);
    }

    fn stage<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.emit(ProgressEvent::StageStarted(stage));
        let out = f().with_context(|| format!("stage '{}' failed", stage.label()))?;
        self.emit(ProgressEvent::StageFinished(stage));
        Ok(out)
    }
}

/// Runs the whole pipeline synchronously on the calling thread. Any failure
/// aborts the run; nothing is retried.
pub fn run_simulation(
    cfg: &SimConfig,
    store: &SimStore,
    inference: &dyn TopicInference,
    events: &Sender<ProgressEvent>,
) -> Result<RunOutcome> {
    let progress = Progress(events);
    let model = GenerativeModel::from_config(cfg)?;
    info!(
        words = model.vocabulary.len(),
        topics = model.vocabulary.topics(),
        block_size = model.vocabulary.block_size(),
        "vocabulary built"
    );

    let run_id = progress.stage(Stage::RecordParameters, || {
        store.record_simulation_parameters(&RunParameters::from_config(cfg, Local::now()))
    })?;
    progress.emit(ProgressEvent::RunRecorded { run_id });
    info!(run_id, "simulation parameters recorded");

    let generated = progress.stage(Stage::Generate, || {
        let mut rng = generation_rng(cfg);
        let docs = model.generator()?.generate(
            run_id,
            cfg.alpha,
            cfg.docs,
            cfg.doc_length,
            &mut rng,
            |done, total| progress.emit(ProgressEvent::DocumentsGenerated { done, total }),
        )?;
        Ok(docs)
    })?;
    if generated.is_empty() {
        return Err(anyhow!("generated corpus is empty"));
    }

    progress.stage(Stage::PersistDocuments, || {
        store.bulk_insert_documents(&generated)
    })?;
    drop(generated);

    let stored = progress.stage(Stage::FetchDocuments, || {
        store.fetch_documents_for_analysis(run_id)
    })?;
    if stored.is_empty() {
        return Err(anyhow!("no documents stored for run {run_id}"));
    }

    let dtm = progress.stage(Stage::BuildMatrix, || {
        Ok(TermDocumentMatrix::from_texts(
            stored.iter().map(|d| d.text.as_str()),
            &model.vocabulary,
        ))
    })?;
    let (rows, cols) = dtm.shape();
    info!(rows, cols, tokens = dtm.total_tokens(), "term-document matrix built");

    let fit = progress.stage(Stage::Infer, || {
        Ok(inference.fit_transform(&dtm, cfg.topics)?)
    })?;
    if fit.doc_topic.len() != stored.len() {
        return Err(anyhow!(
            "{} returned {} rows for {} documents",
            inference.name(),
            fit.doc_topic.len(),
            stored.len()
        ));
    }
    for (topic, words) in fit
        .top_words(&model.vocabulary, TOP_WORDS_LOGGED)
        .iter()
        .enumerate()
    {
        let words: Vec<&str> = words.iter().map(|(w, _)| *w).collect();
        info!(topic, top_words = %words.join(" "), "fitted topic");
    }

    let (records, mean) = progress.stage(Stage::Score, || {
        let truth: Vec<Vec<f64>> = stored.iter().map(|d| d.true_theta.clone()).collect();
        let scores = score_documents(&truth, &fit.doc_topic)?;
        let mean = mean_similarity(&scores).ok_or_else(|| anyhow!("nothing to score"))?;
        let records: Vec<AnalysisRecord> = stored
            .iter()
            .zip(fit.doc_topic.iter())
            .zip(scores)
            .map(|((doc, predicted), cosine_similarity)| AnalysisRecord {
                doc_id: doc.doc_id,
                run_id,
                predicted_theta: predicted.clone(),
                cosine_similarity,
            })
            .collect();
        Ok((records, mean))
    })?;

    progress.stage(Stage::PersistResults, || {
        store.bulk_insert_analysis_results(&records)?;
        store.update_simulation_results(run_id, mean)
    })?;

    let outcome = RunOutcome {
        run_id,
        documents: records.len(),
        mean_similarity: mean,
    };
    progress.emit(ProgressEvent::Completed(outcome.clone()));
    Ok(outcome)
}

/// Submits the pipeline to a worker thread. Progress arrives on the returned
/// receiver; the handle yields the outcome.
pub fn spawn_simulation(
    cfg: SimConfig,
    store: SimStore,
    inference: Box<dyn TopicInference + Send>,
) -> (Receiver<ProgressEvent>, JoinHandle<Result<RunOutcome>>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || run_simulation(&cfg, &store, inference.as_ref(), &tx));
    (rx, handle)
}

/// Spawns the pipeline, logs progress until the worker finishes, and returns
/// its outcome.
pub fn execute(
    cfg: SimConfig,
    store: SimStore,
    inference: Box<dyn TopicInference + Send>,
) -> Result<RunOutcome> {
    let (events, handle) = spawn_simulation(cfg, store, inference);
    for event in events {
        log_event(&event);
    }
    let outcome = handle
        .join()
        .map_err(|_| anyhow!("simulation worker panicked"))?;
    if let Err(err) = &outcome {
        error!("simulation aborted: {err:#}");
    }
    outcome
}

fn log_event(event: &ProgressEvent) {
    match event {
        ProgressEvent::StageStarted(stage) => info!(stage = stage.label(), "stage started"),
        ProgressEvent::StageFinished(stage) => info!(stage = stage.label(), "stage finished"),
        ProgressEvent::RunRecorded { run_id } => info!(run_id, "run created"),
        ProgressEvent::DocumentsGenerated { done, total } => {
            info!(done, total, "generation progress")
        }
        ProgressEvent::Completed(outcome) => info!(
            run_id = outcome.run_id,
            documents = outcome.documents,
            mean_similarity = outcome.mean_similarity,
            "simulation complete"
        ),
    }
}
